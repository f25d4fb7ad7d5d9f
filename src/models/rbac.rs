// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

// =============================================================================
//  Chave de permissão tipada (module:action)
// =============================================================================
// O catálogo é fechado: nada de strings soltas circulando pela aplicação.
// O slug textual só aparece na borda (banco e API).

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum PermissionModule {
    Inventory,
    Employees,
    Customers,
    Sales,
    Attendance,
    Payroll,
    Departments,
    Roles,
    Reports,
    Activity,
}

impl PermissionModule {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionModule::Inventory => "inventory",
            PermissionModule::Employees => "employees",
            PermissionModule::Customers => "customers",
            PermissionModule::Sales => "sales",
            PermissionModule::Attendance => "attendance",
            PermissionModule::Payroll => "payroll",
            PermissionModule::Departments => "departments",
            PermissionModule::Roles => "roles",
            PermissionModule::Reports => "reports",
            PermissionModule::Activity => "activity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum PermissionAction {
    Read,
    Write,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::Read => "read",
            PermissionAction::Write => "write",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct PermissionKey {
    pub module: PermissionModule,
    pub action: PermissionAction,
}

impl PermissionKey {
    pub const fn new(module: PermissionModule, action: PermissionAction) -> Self {
        Self { module, action }
    }

    pub fn slug(&self) -> String {
        format!("{}:{}", self.module.as_str(), self.action.as_str())
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module.as_str(), self.action.as_str())
    }
}

impl FromStr for PermissionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (module, action) = s
            .split_once(':')
            .ok_or_else(|| format!("slug de permissão inválido: '{s}'"))?;

        let module = match module {
            "inventory" => PermissionModule::Inventory,
            "employees" => PermissionModule::Employees,
            "customers" => PermissionModule::Customers,
            "sales" => PermissionModule::Sales,
            "attendance" => PermissionModule::Attendance,
            "payroll" => PermissionModule::Payroll,
            "departments" => PermissionModule::Departments,
            "roles" => PermissionModule::Roles,
            "reports" => PermissionModule::Reports,
            "activity" => PermissionModule::Activity,
            other => return Err(format!("módulo de permissão desconhecido: '{other}'")),
        };

        let action = match action {
            "read" => PermissionAction::Read,
            "write" => PermissionAction::Write,
            other => return Err(format!("ação de permissão desconhecida: '{other}'")),
        };

        Ok(PermissionKey { module, action })
    }
}

// =============================================================================
//  Linhas do banco
// =============================================================================

// O que sai do banco (Tabela Roles)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(ignore)] // Ocultamos tenant_id da documentação pública
    pub tenant_id: Uuid,

    #[schema(example = "Gerente de Vendas")]
    pub name: String,

    #[schema(example = "Acesso completo ao módulo de vendas e clientes")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que sai do banco (Tabela Permissions)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,

    #[schema(example = "Inventory")]
    pub module: String,

    #[schema(example = "read")]
    pub action: String,

    #[schema(example = "inventory:read")]
    pub slug: String,

    #[schema(example = "Visualizar produtos e estoque")]
    pub description: String,
}

// Exceção por usuário, já resolvida para o slug
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionOverride {
    pub permission_id: Uuid,
    pub slug: String,
    pub has_access: bool,
}

// =============================================================================
//  Resolução de permissão efetiva
// =============================================================================

/// De onde veio a decisão final de acesso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum PermissionSource {
    /// Veio apenas dos cargos
    Role,
    /// Exceção forçou o acesso
    Granted,
    /// Exceção retirou o acesso
    Revoked,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermission {
    #[schema(example = "inventory:write")]
    pub slug: String,
    pub has_access: bool,
    pub source: PermissionSource,
}

// =============================================================================
//  Payloads
// =============================================================================

// O Payload para criar/editar um cargo
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[schema(example = "Auxiliar de Estoque")]
    pub name: String,

    #[schema(example = "Pode apenas visualizar produtos e dar entrada em notas")]
    pub description: Option<String>,

    #[schema(example = json!(["inventory:read", "inventory:write"]))]
    pub permissions: Vec<String>, // Slugs das permissões
}

// Uma exceção enviada pelo painel: hasAccess nulo = "herdar do cargo" (remove a linha)
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverrideEntry {
    #[schema(example = "payroll:read")]
    pub permission: String,
    pub has_access: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetOverridesPayload {
    pub overrides: Vec<OverrideEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetRolesPayload {
    pub role_ids: Vec<Uuid>,
}

// Resposta completa (Cargo + Lista de Permissões)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    #[schema(example = json!(["inventory:read", "inventory:write"]))]
    pub permissions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_ida_e_volta() {
        let key = PermissionKey::new(PermissionModule::Payroll, PermissionAction::Write);
        assert_eq!(key.slug(), "payroll:write");
        assert_eq!("payroll:write".parse::<PermissionKey>().unwrap(), key);
    }

    #[test]
    fn slug_invalido_e_rejeitado() {
        assert!("payroll".parse::<PermissionKey>().is_err());
        assert!("payroll:delete".parse::<PermissionKey>().is_err());
        assert!("finance:read".parse::<PermissionKey>().is_err());
    }
}
