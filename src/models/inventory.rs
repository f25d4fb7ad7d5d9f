// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "CAM-001")]
    pub sku: String,

    #[schema(example = "Camiseta Básica Preta M")]
    pub name: String,

    #[schema(example = "Vestuário")]
    pub category: String,

    pub stock: i32,

    #[schema(value_type = f64, example = 49.9)]
    pub price: Decimal,

    pub low_stock_threshold: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.low_stock_threshold > 0 && self.stock <= self.low_stock_threshold
    }
}

/// Linha do CSV de produtos. O export escreve exatamente estas colunas e o
/// import faz upsert por SKU — reimportar um export intacto não muda nada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCsvRecord {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub stock: i32,
    pub price: Decimal,
    pub low_stock_threshold: i32,
}

impl From<&Product> for ProductCsvRecord {
    fn from(p: &Product) -> Self {
        Self {
            sku: p.sku.clone(),
            name: p.name.clone(),
            category: p.category.clone(),
            stock: p.stock,
            price: p.price,
            low_stock_threshold: p.low_stock_threshold,
        }
    }
}

// ---
// Validação customizada
// ---
pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O SKU é obrigatório."))]
    #[schema(example = "CAM-001")]
    pub sku: String,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[serde(default)]
    pub category: String,

    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    #[serde(default)]
    pub stock: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    #[schema(value_type = f64)]
    pub price: Decimal,

    #[validate(range(min = 0, message = "O limite não pode ser negativo."))]
    #[serde(default)]
    pub low_stock_threshold: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[serde(default)]
    pub category: String,

    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock: i32,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub price: Decimal,

    #[validate(range(min = 0, message = "O limite não pode ser negativo."))]
    pub low_stock_threshold: i32,
}

// Resultado do import CSV, para o toast do painel
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CsvImportSummary {
    pub created: usize,
    pub updated: usize,
}
