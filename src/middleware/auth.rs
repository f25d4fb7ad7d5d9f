// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{Claims, SessionKind, User},
};

// O middleware em si. Cabeçalho ausente ou fora do formato Bearer conta
// como token inválido (401), não como requisição malformada.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::InvalidToken)?;

    let (user, claims) = app_state
        .auth_service
        .validate_token(bearer.token())
        .await?;

    // Insere o usuário e as claims nos "extensions" da requisição
    request.extensions_mut().insert(user);
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

// Extrator das claims da sessão (tipo de sessão, personificação)
#[derive(Debug, Clone)]
pub struct SessionClaims(pub Claims);

impl SessionClaims {
    pub fn kind(&self) -> SessionKind {
        self.0.session_kind()
    }
}

impl<S> FromRequestParts<S> for SessionClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(SessionClaims)
            .ok_or(AppError::InvalidToken)
    }
}

/// Guardião das rotas /admin: exige conta de Super Admin em sessão de painel
/// (um Super Admin personificando uma loja NÃO passa por aqui).
#[derive(Debug, Clone)]
pub struct SuperAdminUser(pub User);

impl<S> FromRequestParts<S> for SuperAdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or(AppError::InvalidToken)?;

        if !user.is_super_admin || claims.session_kind() != SessionKind::SuperAdmin {
            return Err(AppError::SuperAdminOnly);
        }

        Ok(SuperAdminUser(user))
    }
}
