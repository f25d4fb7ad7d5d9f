// src/handlers/rbac.rs
//
// Cargos e catálogo de permissões da loja.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::db_utils::get_rls_connection,
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    middleware::rbac::{PermRolesRead, PermRolesWrite, RequirePermission},
    middleware::tenancy::TenantContext,
    models::activity::ActivityAction,
    models::rbac::{CreateRolePayload, Permission, RoleResponse},
};

const MODULE: &str = "Roles";

// Catálogo global de permissões (para o painel montar os checkboxes)
#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Roles",
    responses((status = 200, description = "Catálogo de permissões", body = Vec<Permission>)),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    _tenant: TenantContext,
    _guard: RequirePermission<PermRolesRead>,
) -> Result<Json<Vec<Permission>>, AppError> {
    let permissions = app_state.rbac_repo.list_all_permissions().await?;
    Ok(Json(permissions))
}

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "Roles",
    responses((status = 200, description = "Cargos da loja com seus slugs", body = Vec<RoleResponse>)),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermRolesRead>,
) -> Result<Json<Vec<RoleResponse>>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let roles = app_state
        .rbac_service
        .list_roles(&mut rls_conn, tenant.tenant_id)
        .await?;
    Ok(Json(roles))
}

pub async fn create_role(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermRolesWrite>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let role = app_state
        .rbac_service
        .create_role(&mut rls_conn, tenant.tenant_id, &payload)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Created,
            MODULE,
            Some(role.role.id),
        )
        .await?;
    rls_conn.commit().await?;

    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermRolesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateRolePayload>,
) -> Result<Json<RoleResponse>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let role = app_state
        .rbac_service
        .update_role(&mut rls_conn, tenant.tenant_id, id, &payload)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Updated,
            MODULE,
            Some(id),
        )
        .await?;
    rls_conn.commit().await?;

    Ok(Json(role))
}

pub async fn delete_role(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermRolesWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    app_state
        .rbac_service
        .delete_role(&mut rls_conn, tenant.tenant_id, id)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Deleted,
            MODULE,
            Some(id),
        )
        .await?;
    rls_conn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
