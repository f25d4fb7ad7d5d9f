// src/db/tenancy_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::pagination,
    models::tenancy::{Tenant, TenantStats, TenantStatus},
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn find_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, AppError> {
        let tenant =
            sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE subdomain = lower($1)")
                .bind(subdomain)
                .fetch_optional(&self.pool)
                .await?;
        Ok(tenant)
    }

    pub async fn list(
        &self,
        search: &str,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Tenant>, i64, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tenants
            WHERE ($1 = '' OR name ILIKE '%' || $1 || '%' OR subdomain ILIKE '%' || $1 || '%')
            "#,
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        let page = pagination::clamp_page(page, total, per_page);

        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT * FROM tenants
            WHERE ($1 = '' OR name ILIKE '%' || $1 || '%' OR subdomain ILIKE '%' || $1 || '%')
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(search)
        .bind(per_page)
        .bind(pagination::offset(page, per_page))
        .fetch_all(&self.pool)
        .await?;

        Ok((tenants, total, page))
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        subdomain: &str,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, subdomain)
            VALUES ($1, lower($2))
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(subdomain)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::SubdomainAlreadyExists(subdomain.to_string());
                }
            }
            e.into()
        })
    }

    pub async fn set_status(&self, id: Uuid, status: TenantStatus) -> Result<Tenant, AppError> {
        sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("loja".into()))
    }

    /// Números agregados do painel. Roda por uma conexão com o app.tenant_id
    /// da loja alvo já definido (as tabelas contadas têm RLS).
    pub async fn stats(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
    ) -> Result<TenantStats, AppError> {
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&mut *conn)
            .await?;

        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&mut *conn)
                .await?;

        let customers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&mut *conn)
                .await?;

        let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&mut *conn)
            .await?;

        let revenue: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_amount), 0)
            FROM orders
            WHERE tenant_id = $1 AND status IN ('Paid', 'Shipped')
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(TenantStats {
            users,
            products,
            customers,
            orders,
            revenue,
        })
    }
}
