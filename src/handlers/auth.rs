// src/handlers/auth.rs

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{
        AuthResponse, ForgotPasswordPayload, LoginTwoFactorPayload, LoginUserPayload,
        RegisterUserPayload, ResetPasswordPayload, TwoFactorRequiredResponse, VerifyEmailPayload,
    },
    models::tenancy::TenantStatus,
};

/// Login não passa pelo tenant_guard (ainda não há token), então o
/// cabeçalho x-tenant-id é resolvido aqui: ausente = login de Super Admin.
async fn tenant_id_from_header(
    app_state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Uuid>, AppError> {
    let Some(value) = headers.get("x-tenant-id").and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };

    let tenant = match Uuid::parse_str(value) {
        Ok(id) => app_state.tenant_repo.find_by_id(id).await?,
        Err(_) => app_state.tenant_repo.find_by_subdomain(value).await?,
    }
    .ok_or_else(|| AppError::NotFound("loja".into()))?;

    if tenant.status != TenantStatus::Active {
        return Err(AppError::TenantInactive);
    }
    Ok(Some(tenant.id))
}

// Handler de registro
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Conta criada aguardando aprovação"),
        (status = 409, description = "E-mail já cadastrado na loja")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let user = app_state
        .auth_service
        .register_user(
            &payload.username,
            &payload.email,
            &payload.password,
            &payload.tenant_subdomain,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Cadastro recebido. Confirme seu e-mail e aguarde a aprovação.",
            "userId": user.id,
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    tag = "Auth",
    request_body = VerifyEmailPayload,
    responses(
        (status = 200, description = "E-mail confirmado"),
        (status = 401, description = "Código inválido ou expirado")
    )
)]
pub async fn verify_email(
    State(app_state): State<AppState>,
    Json(payload): Json<VerifyEmailPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .auth_service
        .verify_email(&payload.tenant_subdomain, &payload.email, &payload.code)
        .await?;

    Ok(Json(json!({ "message": "E-mail confirmado com sucesso." })))
}

// Handler de login. Com 2FA habilitado responde 202 sem token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Sessão aberta", body = AuthResponse),
        (status = 202, description = "Falta o segundo fator", body = TwoFactorRequiredResponse),
        (status = 401, description = "Credenciais inválidas")
    ),
    params(
        ("x-tenant-id" = Option<String>, Header, description = "Loja (UUID ou subdomínio); ausente para Super Admin")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginUserPayload>,
) -> Result<axum::response::Response, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let tenant_id = tenant_id_from_header(&app_state, &headers).await?;

    match app_state
        .auth_service
        .login_user(tenant_id, &payload.email, &payload.password)
        .await?
    {
        Some((token, user)) => Ok(Json(AuthResponse { token, user }).into_response()),
        None => Ok((
            StatusCode::ACCEPTED,
            Json(TwoFactorRequiredResponse {
                two_factor_required: true,
            }),
        )
            .into_response()),
    }
}

// Segunda submissão do login quando o 2FA está habilitado
#[utoipa::path(
    post,
    path = "/api/auth/login/2fa",
    tag = "Auth",
    request_body = LoginTwoFactorPayload,
    responses(
        (status = 200, description = "Sessão aberta", body = AuthResponse),
        (status = 401, description = "Credenciais ou código inválidos")
    ),
    params(
        ("x-tenant-id" = Option<String>, Header, description = "Loja (UUID ou subdomínio)")
    )
)]
pub async fn login_two_factor(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginTwoFactorPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let tenant_id = tenant_id_from_header(&app_state, &headers).await?;
    let (token, user) = app_state
        .auth_service
        .login_two_factor(tenant_id, &payload.email, &payload.password, &payload.code)
        .await?;

    Ok(Json(AuthResponse { token, user }))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordPayload,
    responses(
        (status = 200, description = "Se a conta existir, o código foi enviado")
    )
)]
pub async fn forgot_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ForgotPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .auth_service
        .forgot_password(&payload.tenant_subdomain, &payload.email)
        .await?;

    Ok(Json(
        json!({ "message": "Se a conta existir, enviamos um código por e-mail." }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordPayload,
    responses(
        (status = 200, description = "Senha redefinida"),
        (status = 401, description = "Código inválido ou expirado")
    )
)]
pub async fn reset_password(
    State(app_state): State<AppState>,
    Json(payload): Json<ResetPasswordPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .auth_service
        .reset_password(
            &payload.tenant_subdomain,
            &payload.email,
            &payload.code,
            &payload.new_password,
        )
        .await?;

    Ok(Json(json!({ "message": "Senha redefinida com sucesso." })))
}
