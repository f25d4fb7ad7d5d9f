// src/models/hr.rs
//
// Módulo de RH: departamentos, presença e folha de pagamento.
// (Funcionário é o próprio User da loja — veja models/auth.rs.)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    #[schema(example = "Comercial")]
    pub name: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
}

// ---
// Presença
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "attendance_status")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Leave => "Leave",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Present" => Some(AttendanceStatus::Present),
            "Absent" => Some(AttendanceStatus::Absent),
            "Leave" => Some(AttendanceStatus::Leave),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub user_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendancePayload {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceFilter {
    pub user_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Linha do CSV de presença (import e export usam as mesmas colunas)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceCsvRecord {
    pub email: String,
    pub date: NaiveDate,
    pub status: String,
}

// ---
// Folha de pagamento
// ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payslip {
    pub id: Uuid,

    #[schema(ignore)]
    pub tenant_id: Uuid,

    pub user_id: Uuid,
    pub month: i32,
    pub year: i32,

    #[schema(value_type = f64)]
    pub basic_salary: Decimal,
    #[schema(value_type = f64)]
    pub total_deductions: Decimal,
    #[schema(value_type = f64)]
    pub bonus: Decimal,
    #[schema(value_type = f64)]
    pub net_salary: Decimal,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PayslipFilter {
    pub user_id: Option<Uuid>,
    pub month: Option<i32>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayrollPayload {
    #[validate(range(min = 1, max = 12, message = "Mês inválido."))]
    pub month: i32,

    #[validate(range(min = 2000, max = 2100, message = "Ano inválido."))]
    pub year: i32,

    /// Bônus opcional aplicado a todos os holerites gerados
    #[serde(default)]
    #[schema(value_type = f64)]
    pub bonus: Decimal,
}

// ---
// Funcionários (payloads de edição; a linha é o User)
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeePayload {
    #[validate(length(min = 3, message = "O nome de usuário deve ter no mínimo 3 caracteres."))]
    pub username: String,

    pub department_id: Option<Uuid>,

    #[schema(value_type = f64)]
    pub basic_salary: Decimal,

    pub bank_name: Option<String>,
    pub bank_account: Option<String>,

    pub status: crate::models::auth::UserStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub department_id: Option<Uuid>,
    pub status: Option<crate::models::auth::UserStatus>,
}
