// src/db/notification_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::notification::Notification};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persiste a notificação antes do push em tempo real: quem não estava
    /// conectado recupera na listagem.
    pub async fn insert(
        &self,
        tenant_id: Option<Uuid>,
        user_id: Option<Uuid>,
        event: &str,
        message: &str,
        link: Option<&str>,
    ) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (tenant_id, user_id, event, message, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(event)
        .bind(message)
        .bind(link)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    /// Notificações visíveis para o usuário na loja: as dirigidas a ele e as
    /// da sala inteira (user_id nulo).
    pub async fn list_for_user(
        &self,
        tenant_id: Option<Uuid>,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE tenant_id IS NOT DISTINCT FROM $1
              AND (user_id IS NULL OR user_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND (user_id IS NULL OR user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("notificação".into()));
        }
        Ok(())
    }
}
