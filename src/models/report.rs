// src/models/report.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::inventory::Product;

/// Resumo do painel: contagens, faturamento e os produtos no limite.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub products: i64,
    pub customers: i64,
    pub orders: i64,

    /// Soma dos pedidos pagos e enviados
    #[schema(value_type = f64)]
    pub revenue: Decimal,

    pub low_stock: Vec<Product>,
}
