// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::pagination,
    models::inventory::{CreateProductPayload, Product, UpdateProductPayload},
};

// Todas as queries recebem a conexão RLS de quem chama
#[derive(Clone)]
pub struct ProductRepository;

impl ProductRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("produto".into()))
    }

    pub async fn list(
        &self,
        conn: &mut sqlx::PgConnection,
        search: &str,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Product>, i64, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE ($1 = '' OR name ILIKE '%' || $1 || '%'
                          OR sku ILIKE '%' || $1 || '%'
                          OR category ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(search)
        .fetch_one(&mut *conn)
        .await?;

        let page = pagination::clamp_page(page, total, per_page);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1 = '' OR name ILIKE '%' || $1 || '%'
                          OR sku ILIKE '%' || $1 || '%'
                          OR category ILIKE '%' || $1 || '%')
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(search)
        .bind(per_page)
        .bind(pagination::offset(page, per_page))
        .fetch_all(&mut *conn)
        .await?;

        Ok((products, total, page))
    }

    pub async fn list_all(&self, conn: &mut sqlx::PgConnection) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY name, id")
            .fetch_all(conn)
            .await?;
        Ok(products)
    }

    pub async fn list_low_stock(
        &self,
        conn: &mut sqlx::PgConnection,
    ) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE stock <= low_stock_threshold ORDER BY stock, name",
        )
        .fetch_all(conn)
        .await?;
        Ok(products)
    }

    pub async fn create(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        payload: &CreateProductPayload,
    ) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (tenant_id, sku, name, category, stock, price, low_stock_threshold)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.sku)
        .bind(&payload.name)
        .bind(&payload.category)
        .bind(payload.stock)
        .bind(payload.price)
        .bind(payload.low_stock_threshold)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::SkuAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn update(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                stock = COALESCE($4, stock),
                price = COALESCE($5, price),
                low_stock_threshold = COALESCE($6, low_stock_threshold),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.category)
        .bind(payload.stock)
        .bind(payload.price)
        .bind(payload.low_stock_threshold)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("produto".into()))
    }

    pub async fn delete(&self, conn: &mut sqlx::PgConnection, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("produto".into()));
        }
        Ok(())
    }

    /// Insere ou atualiza pelo SKU. Retorna true quando o produto já existia.
    pub async fn upsert_by_sku(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        sku: &str,
        name: &str,
        category: &str,
        stock: i32,
        price: Decimal,
        low_stock_threshold: i32,
    ) -> Result<bool, AppError> {
        let existed: bool = sqlx::query_scalar(
            r#"
            INSERT INTO products (tenant_id, sku, name, category, stock, price, low_stock_threshold)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (tenant_id, sku) DO UPDATE SET
                name = EXCLUDED.name,
                category = EXCLUDED.category,
                stock = EXCLUDED.stock,
                price = EXCLUDED.price,
                low_stock_threshold = EXCLUDED.low_stock_threshold,
                updated_at = now()
            RETURNING (xmax <> 0)
            "#,
        )
        .bind(tenant_id)
        .bind(sku)
        .bind(name)
        .bind(category)
        .bind(stock)
        .bind(price)
        .bind(low_stock_threshold)
        .fetch_one(conn)
        .await?;

        Ok(existed)
    }

    /// Debita o estoque, falhando se não houver quantidade suficiente.
    pub async fn decrement_stock(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE products SET stock = stock - $2, updated_at = now()
            WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let product = self.find_by_id(conn, id).await?;
            return Err(AppError::InsufficientStock(product.name));
        }
        Ok(())
    }

    pub async fn restore_stock<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(executor)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Acquire;

    /// Superusuário do Postgres ignora RLS; para o teste valer alguma coisa,
    /// rebaixamos a sessão para um papel comum quando for o caso.
    async fn rebaixar_se_superusuario(conn: &mut sqlx::PgConnection) {
        let superusuario: bool =
            sqlx::query_scalar("SELECT rolsuper FROM pg_roles WHERE rolname = current_user")
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        if !superusuario {
            return;
        }

        sqlx::query(
            "DO $$ BEGIN CREATE ROLE papel_comum NOSUPERUSER; \
             EXCEPTION WHEN duplicate_object THEN NULL; END $$",
        )
        .execute(&mut *conn)
        .await
        .unwrap();
        sqlx::query("GRANT ALL ON ALL TABLES IN SCHEMA public TO papel_comum")
            .execute(&mut *conn)
            .await
            .unwrap();
        sqlx::query("SET ROLE papel_comum")
            .execute(&mut *conn)
            .await
            .unwrap();
    }

    #[sqlx::test]
    async fn produto_de_uma_loja_nao_vaza_para_outra(pool: sqlx::PgPool) {
        let repo = ProductRepository::new();
        let mut conn = pool.acquire().await.unwrap();

        let loja_a: Uuid = sqlx::query_scalar(
            "INSERT INTO tenants (name, subdomain) VALUES ('Loja A', 'loja-a') RETURNING id",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();
        let loja_b: Uuid = sqlx::query_scalar(
            "INSERT INTO tenants (name, subdomain) VALUES ('Loja B', 'loja-b') RETURNING id",
        )
        .fetch_one(&mut *conn)
        .await
        .unwrap();

        rebaixar_se_superusuario(&mut conn).await;

        for (loja, sku) in [(loja_a, "A-01"), (loja_b, "B-01")] {
            let mut tx = conn.begin().await.unwrap();
            sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
                .bind(loja.to_string())
                .execute(&mut *tx)
                .await
                .unwrap();
            sqlx::query(
                "INSERT INTO products (tenant_id, sku, name, category, stock, price) \
                 VALUES ($1, $2, 'Produto', 'Geral', 5, 10.00)",
            )
            .bind(loja)
            .bind(sku)
            .execute(&mut *tx)
            .await
            .unwrap();
            tx.commit().await.unwrap();
        }

        // No contexto da loja A só o produto dela aparece
        let mut tx = conn.begin().await.unwrap();
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(loja_a.to_string())
            .execute(&mut *tx)
            .await
            .unwrap();
        let visiveis = repo.list_all(&mut tx).await.unwrap();
        drop(tx);

        assert_eq!(visiveis.len(), 1);
        assert_eq!(visiveis[0].sku, "A-01");
        assert_eq!(visiveis[0].tenant_id, loja_a);

        // Sem app.tenant_id nenhum, nada aparece
        let mut tx = conn.begin().await.unwrap();
        let nenhum = repo.list_all(&mut tx).await.unwrap();
        assert!(nenhum.is_empty());
    }
}
