// src/services/inventory_service.rs

use sqlx::Acquire;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductRepository,
    models::inventory::{
        CreateProductPayload, CsvImportSummary, Product, ProductCsvRecord, UpdateProductPayload,
    },
};

#[derive(Clone)]
pub struct InventoryService {
    product_repo: ProductRepository,
}

/// Serializa os produtos no formato do export. O import lê exatamente as
/// mesmas colunas, então exportar e reimportar é um no-op.
pub fn encode_products_csv(products: &[Product]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for product in products {
        writer
            .serialize(ProductCsvRecord::from(product))
            .map_err(|e| anyhow::anyhow!("Falha ao escrever CSV: {e}"))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Falha ao finalizar CSV: {e}").into())
}

/// Lê o corpo do upload linha a linha. A primeira linha inválida aborta o
/// import inteiro com o número da linha no erro (nada é gravado).
pub fn decode_products_csv(bytes: &[u8]) -> Result<Vec<ProductCsvRecord>, AppError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut records = Vec::new();

    for (index, row) in reader.deserialize::<ProductCsvRecord>().enumerate() {
        // linha 1 é o cabeçalho
        let line = index + 2;
        let record = row.map_err(|e| AppError::CsvRow(line, e.to_string()))?;

        if record.sku.trim().is_empty() {
            return Err(AppError::CsvRow(line, "SKU vazio".into()));
        }
        if record.stock < 0 || record.low_stock_threshold < 0 {
            return Err(AppError::CsvRow(line, "valor negativo".into()));
        }
        if record.price.is_sign_negative() {
            return Err(AppError::CsvRow(line, "preço negativo".into()));
        }

        records.push(record);
    }

    Ok(records)
}

/// Nome do arquivo de export: products_<YYYY-MM>.csv
pub fn export_filename(now: chrono::DateTime<chrono::Utc>) -> String {
    format!("products_{}.csv", now.format("%Y-%m"))
}

impl InventoryService {
    pub fn new(product_repo: ProductRepository) -> Self {
        Self { product_repo }
    }

    pub async fn list(
        &self,
        conn: &mut sqlx::PgConnection,
        search: &str,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Product>, i64, i64), AppError> {
        self.product_repo.list(conn, search, page, per_page).await
    }

    pub async fn get(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<Product, AppError> {
        self.product_repo.find_by_id(conn, id).await
    }

    pub async fn create(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        payload: &CreateProductPayload,
    ) -> Result<Product, AppError> {
        self.product_repo.create(conn, tenant_id, payload).await
    }

    pub async fn update(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Product, AppError> {
        self.product_repo.update(conn, id, payload).await
    }

    pub async fn delete(&self, conn: &mut sqlx::PgConnection, id: Uuid) -> Result<(), AppError> {
        self.product_repo.delete(conn, id).await
    }

    pub async fn export_csv(&self, conn: &mut sqlx::PgConnection) -> Result<Vec<u8>, AppError> {
        let products = self.product_repo.list_all(conn).await?;
        encode_products_csv(&products)
    }

    /// Import por upsert de SKU: linha com SKU novo cria, SKU conhecido
    /// atualiza. O CSV inteiro é validado antes de qualquer escrita.
    pub async fn import_csv(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        bytes: &[u8],
    ) -> Result<CsvImportSummary, AppError> {
        let records = decode_products_csv(bytes)?;

        let mut summary = CsvImportSummary {
            created: 0,
            updated: 0,
        };

        // Uma linha que falhe no meio desfaz os upserts anteriores
        let mut tx = conn.begin().await?;
        for record in &records {
            let existed = self
                .product_repo
                .upsert_by_sku(
                    &mut tx,
                    tenant_id,
                    &record.sku,
                    &record.name,
                    &record.category,
                    record.stock,
                    record.price,
                    record.low_stock_threshold,
                )
                .await?;

            if existed {
                summary.updated += 1;
            } else {
                summary.created += 1;
            }
        }
        tx.commit().await?;

        Ok(summary)
    }

    pub async fn low_stock(
        &self,
        conn: &mut sqlx::PgConnection,
    ) -> Result<Vec<Product>, AppError> {
        self.product_repo.list_low_stock(conn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn record(sku: &str) -> ProductCsvRecord {
        ProductCsvRecord {
            sku: sku.into(),
            name: "Camiseta".into(),
            category: "Vestuário".into(),
            stock: 10,
            price: Decimal::new(4990, 2),
            low_stock_threshold: 3,
        }
    }

    #[test]
    fn csv_ida_e_volta_preserva_as_linhas() {
        let records = vec![record("CAM-001"), record("CAM-002")];

        let mut writer = csv::Writer::from_writer(Vec::new());
        for r in &records {
            writer.serialize(r).unwrap();
        }
        let bytes = writer.into_inner().unwrap();

        let decoded = decode_products_csv(&bytes).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn linha_invalida_aborta_com_o_numero_certo() {
        let bytes =
            b"sku,name,category,stock,price,low_stock_threshold\nCAM-001,Camiseta,V,10,49.90,3\n,Sem SKU,V,1,1.00,0\n";
        let err = decode_products_csv(bytes).unwrap_err();

        match err {
            AppError::CsvRow(line, _) => assert_eq!(line, 3),
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn estoque_negativo_e_rejeitado() {
        let bytes =
            b"sku,name,category,stock,price,low_stock_threshold\nCAM-001,Camiseta,V,-5,49.90,3\n";
        assert!(matches!(
            decode_products_csv(bytes),
            Err(AppError::CsvRow(2, _))
        ));
    }

    #[test]
    fn nome_do_arquivo_carrega_ano_e_mes() {
        let when = chrono::Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(export_filename(when), "products_2026-03.csv");
    }
}
