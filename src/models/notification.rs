// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,

    /// Nulo = notificação da sala do Super Admin
    #[schema(ignore)]
    pub tenant_id: Option<Uuid>,

    /// Nulo = sala inteira (não endereçada a um usuário específico)
    pub user_id: Option<Uuid>,

    #[schema(example = "new_user_request")]
    pub event: String,

    #[schema(example = "joao.silva pediu acesso à loja ACME")]
    pub message: String,

    #[schema(example = "/employees?status=Pending")]
    pub link: Option<String>,

    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// O que trafega na sala realtime (o mesmo shape vira JSON no SSE)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    pub event: String,
    pub message: String,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}
