// src/db/activity_repo.rs

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::pagination,
    models::activity::{ActivityAction, ActivityLogRow},
};

// Todas as queries recebem a conexão RLS de quem chama
#[derive(Clone)]
pub struct ActivityRepository;

impl ActivityRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn record(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        user_id: Uuid,
        action: ActivityAction,
        module: &str,
        entity_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (tenant_id, user_id, action, module, entity_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(action)
        .bind(module)
        .bind(entity_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn list(
        &self,
        conn: &mut sqlx::PgConnection,
        user_id: Option<Uuid>,
        module: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<ActivityLogRow>, i64, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM activity_logs
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR module = $2)
              AND ($3::date IS NULL OR created_at >= $3)
              AND ($4::date IS NULL OR created_at < $4 + 1)
            "#,
        )
        .bind(user_id)
        .bind(module)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *conn)
        .await?;

        let page = pagination::clamp_page(page, total, per_page);

        let logs = sqlx::query_as::<_, ActivityLogRow>(
            r#"
            SELECT a.id, a.user_id, u.username, a.action, a.module, a.entity_id, a.created_at
            FROM activity_logs a
            JOIN users u ON u.id = a.user_id
            WHERE ($1::uuid IS NULL OR a.user_id = $1)
              AND ($2::text IS NULL OR a.module = $2)
              AND ($3::date IS NULL OR a.created_at >= $3)
              AND ($4::date IS NULL OR a.created_at < $4 + 1)
            ORDER BY a.created_at DESC, a.id
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(user_id)
        .bind(module)
        .bind(from)
        .bind(to)
        .bind(per_page)
        .bind(pagination::offset(page, per_page))
        .fetch_all(&mut *conn)
        .await?;

        Ok((logs, total, page))
    }
}
