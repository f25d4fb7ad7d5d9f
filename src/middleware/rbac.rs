// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::User,
    models::rbac::{PermissionAction, PermissionKey, PermissionModule},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn key() -> PermissionKey;
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        // A. Extrai Usuário (o auth_guard já rodou)
        let user = parts
            .extensions
            .get::<User>()
            .ok_or(AppError::InvalidToken)?;

        // B. Pega o slug da permissão
        let required = T::key().slug();

        // C. Verifica no Banco (o override individual sempre vence o papel)
        let has_permission = app_state
            .rbac_repo
            .user_has_permission(user.id, &required)
            .await?;

        if !has_permission {
            return Err(AppError::PermissionDenied(required));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission_type {
    ($name:ident, $module:ident, $action:ident) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn key() -> PermissionKey {
                PermissionKey::new(PermissionModule::$module, PermissionAction::$action)
            }
        }
    };
}

permission_type!(PermInventoryRead, Inventory, Read);
permission_type!(PermInventoryWrite, Inventory, Write);
permission_type!(PermEmployeesRead, Employees, Read);
permission_type!(PermEmployeesWrite, Employees, Write);
permission_type!(PermCustomersRead, Customers, Read);
permission_type!(PermCustomersWrite, Customers, Write);
permission_type!(PermSalesRead, Sales, Read);
permission_type!(PermSalesWrite, Sales, Write);
permission_type!(PermAttendanceRead, Attendance, Read);
permission_type!(PermAttendanceWrite, Attendance, Write);
permission_type!(PermPayrollRead, Payroll, Read);
permission_type!(PermPayrollWrite, Payroll, Write);
permission_type!(PermDepartmentsRead, Departments, Read);
permission_type!(PermDepartmentsWrite, Departments, Write);
permission_type!(PermRolesRead, Roles, Read);
permission_type!(PermRolesWrite, Roles, Write);
permission_type!(PermReportsRead, Reports, Read);
permission_type!(PermActivityRead, Activity, Read);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tipos_de_permissao_geram_os_slugs_do_seed() {
        assert_eq!(PermInventoryRead::key().slug(), "inventory:read");
        assert_eq!(PermSalesWrite::key().slug(), "sales:write");
        assert_eq!(PermReportsRead::key().slug(), "reports:read");
        assert_eq!(PermActivityRead::key().slug(), "activity:read");
    }
}
