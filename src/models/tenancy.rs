// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tenant_status")]
pub enum TenantStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,

    #[schema(example = "ACME Ltda")]
    pub name: String,

    #[schema(example = "acme")]
    pub subdomain: String,

    pub status: TenantStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Números agregados do painel Super Admin
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantStats {
    pub users: i64,
    pub products: i64,
    pub customers: i64,
    pub orders: i64,
    #[schema(value_type = f64)]
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantDetail {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub stats: TenantStats,
}

// ---
// Payloads
// ---

// Criar loja já provisiona o usuário administrador dela
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "ACME Ltda")]
    pub name: String,

    #[validate(length(min = 2, message = "O subdomínio deve ter no mínimo 2 caracteres."))]
    #[schema(example = "acme")]
    pub subdomain: String,

    #[validate(length(min = 3, message = "O nome de usuário deve ter no mínimo 3 caracteres."))]
    #[schema(example = "admin.acme")]
    pub admin_username: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "admin@acme.com")]
    pub admin_email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub admin_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetTenantStatusPayload {
    pub status: TenantStatus,
}
