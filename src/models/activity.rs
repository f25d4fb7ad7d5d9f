// src/models/activity.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "activity_action")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
}

// Linha de listagem com o nome de quem fez (join com users)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub action: ActivityAction,

    #[schema(example = "Inventory")]
    pub module: String,

    pub entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    pub user_id: Option<Uuid>,
    pub module: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
