// src/handlers/crm.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::db_utils::get_rls_connection,
    common::error::AppError,
    common::pagination::{PageParams, Paginated},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    middleware::rbac::{PermCustomersRead, PermCustomersWrite, RequirePermission},
    middleware::tenancy::TenantContext,
    models::activity::ActivityAction,
    models::crm::{Customer, CustomerPayload},
};

const MODULE: &str = "Customers";

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(
        PageParams,
        ("x-tenant-id" = String, Header, description = "Loja (UUID ou subdomínio)")
    ),
    responses((status = 200, description = "Página de clientes", body = Paginated<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCustomersRead>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Customer>>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let per_page = params.per_page();
    let (items, total, page) = app_state
        .crm_service
        .list(&mut rls_conn, &params.search(), params.page(), per_page)
        .await?;

    Ok(Json(Paginated::new(items, total, page, per_page)))
}

pub async fn get_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCustomersRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let customer = app_state.crm_service.get(&mut rls_conn, id).await?;
    Ok(Json(customer))
}

pub async fn create_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCustomersWrite>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let customer = app_state
        .crm_service
        .create(&mut rls_conn, tenant.tenant_id, &payload)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Created,
            MODULE,
            Some(customer.id),
        )
        .await?;
    rls_conn.commit().await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCustomersWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<Customer>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let customer = app_state
        .crm_service
        .update(&mut rls_conn, id, &payload)
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

    Ok(Json(customer))
}

pub async fn delete_customer(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermCustomersWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    app_state.crm_service.delete(&mut rls_conn, id).await?;

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
