// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{Claims, SessionKind, User},
    models::tenancy::TenantStatus,
};

// O nome do nosso cabeçalho HTTP customizado
const TENANT_ID_HEADER: &str = "x-tenant-id";

// Contexto da loja resolvida para a requisição atual
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub subdomain: String,
}

/// Guardião das rotas de loja. Resolve o cabeçalho X-Tenant-ID (UUID ou
/// subdomínio), confere que a loja está ativa e que a sessão pertence a ela.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(TENANT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::BadRequest(
            "O cabeçalho X-Tenant-ID é obrigatório.".into(),
        ))?
        .to_string();

    // UUID direto ou subdomínio (o front usa o subdomínio da URL)
    let tenant = match Uuid::parse_str(&header_value) {
        Ok(id) => app_state.tenant_repo.find_by_id(id).await?,
        Err(_) => app_state.tenant_repo.find_by_subdomain(&header_value).await?,
    }
    .ok_or_else(|| AppError::NotFound("loja".into()))?;

    if tenant.status != TenantStatus::Active {
        return Err(AppError::TenantInactive);
    }

    // A sessão precisa pertencer à loja do cabeçalho. Sessões de Super Admin
    // só entram personificadas (o token de personificação carrega a loja).
    let user = request
        .extensions()
        .get::<User>()
        .ok_or(AppError::InvalidToken)?;
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or(AppError::InvalidToken)?;

    match claims.session_kind() {
        SessionKind::Tenant(tenant_id) | SessionKind::Impersonated { tenant_id, .. }
            if tenant_id == tenant.id => {}
        _ => return Err(AppError::NotATenantMember),
    }

    if !user.is_super_admin && user.tenant_id != Some(tenant.id) {
        return Err(AppError::NotATenantMember);
    }

    request.extensions_mut().insert(TenantContext {
        tenant_id: tenant.id,
        subdomain: tenant.subdomain,
    });

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .ok_or_else(|| AppError::BadRequest("Contexto da loja não encontrado.".into()))
    }
}
