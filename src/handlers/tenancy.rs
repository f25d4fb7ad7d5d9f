// src/handlers/tenancy.rs
//
// Diretório de lojas do Super Admin. Tudo aqui exige uma sessão global
// (o extractor SuperAdminUser rejeita sessões de loja e de personificação).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    common::pagination::{PageParams, Paginated},
    config::AppState,
    middleware::auth::SuperAdminUser,
    models::auth::AuthResponse,
    models::tenancy::{CreateTenantPayload, SetTenantStatusPayload, Tenant, TenantDetail},
};

#[utoipa::path(
    get,
    path = "/api/admin/tenants",
    tag = "Admin",
    params(PageParams),
    responses(
        (status = 200, description = "Página de lojas", body = Paginated<Tenant>),
        (status = 403, description = "Sessão sem privilégio de Super Admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tenants(
    State(app_state): State<AppState>,
    _admin: SuperAdminUser,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Tenant>>, AppError> {
    let per_page = params.per_page();
    let (items, total, page) = app_state
        .tenancy_service
        .list_tenants(&params.search(), params.page(), per_page)
        .await?;

    Ok(Json(Paginated::new(items, total, page, per_page)))
}

// Criar a loja provisiona junto o cargo "Administrador" e o primeiro usuário
#[utoipa::path(
    post,
    path = "/api/admin/tenants",
    tag = "Admin",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Loja provisionada com o admin inicial", body = Tenant),
        (status = 409, description = "Subdomínio já em uso")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    _admin: SuperAdminUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let tenant = app_state
        .tenancy_service
        .create_tenant_with_admin(&payload)
        .await?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

#[utoipa::path(
    get,
    path = "/api/admin/tenants/{id}",
    tag = "Admin",
    responses((status = 200, description = "Loja com os agregados do painel", body = TenantDetail)),
    security(("api_jwt" = []))
)]
pub async fn tenant_detail(
    State(app_state): State<AppState>,
    _admin: SuperAdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TenantDetail>, AppError> {
    let detail = app_state.tenancy_service.tenant_detail(id).await?;
    Ok(Json(detail))
}

pub async fn set_tenant_status(
    State(app_state): State<AppState>,
    _admin: SuperAdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetTenantStatusPayload>,
) -> Result<Json<Tenant>, AppError> {
    let tenant = app_state
        .tenancy_service
        .set_status(id, payload.status)
        .await?;
    Ok(Json(tenant))
}

// Entra na loja como o administrador dela (token carrega quem personificou)
#[utoipa::path(
    post,
    path = "/api/admin/tenants/{id}/impersonate",
    tag = "Admin",
    responses(
        (status = 200, description = "Token de personificação", body = AuthResponse),
        (status = 404, description = "Loja sem administrador ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn impersonate_tenant(
    State(app_state): State<AppState>,
    SuperAdminUser(admin): SuperAdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AuthResponse>, AppError> {
    let (token, user) = app_state.auth_service.impersonate(&admin, id).await?;
    Ok(Json(AuthResponse { token, user }))
}
