// src/db/crm_repo.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::pagination,
    models::crm::{Customer, CustomerPayload},
};

// Todas as queries recebem a conexão RLS de quem chama
#[derive(Clone)]
pub struct CustomerRepository;

impl CustomerRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_id(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("cliente".into()))
    }

    pub async fn list(
        &self,
        conn: &mut sqlx::PgConnection,
        search: &str,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Customer>, i64, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM customers
            WHERE ($1 = '' OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(search)
        .fetch_one(&mut *conn)
        .await?;

        let page = pagination::clamp_page(page, total, per_page);

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE ($1 = '' OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')
            ORDER BY name, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(search)
        .bind(per_page)
        .bind(pagination::offset(page, per_page))
        .fetch_all(&mut *conn)
        .await?;

        Ok((customers, total, page))
    }

    pub async fn create(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (tenant_id, name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .fetch_one(conn)
        .await?;
        Ok(customer)
    }

    pub async fn update(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers SET
                name = $2,
                email = $3,
                phone = $4,
                address = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("cliente".into()))
    }

    pub async fn delete(&self, conn: &mut sqlx::PgConnection, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("cliente".into()));
        }
        Ok(())
    }
}
