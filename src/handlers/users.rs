// src/handlers/users.rs

use axum::{Json, extract::Multipart, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{EnableTwoFactorPayload, TwoFactorSetupResponse, User},
    models::rbac::EffectivePermission,
};

// O perfil inclui as permissões efetivas para o front montar o menu sem
// uma segunda chamada
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub permissions: Vec<EffectivePermission>,
}

// Perfil do usuário logado (o token já foi validado pelo auth_guard)
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses((status = 200, description = "Perfil da sessão com permissões", body = ProfileResponse)),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let permissions = app_state.rbac_service.effective_permissions(user.id).await?;
    Ok(Json(ProfileResponse { user, permissions }))
}

// Permissões efetivas (cargos + exceções) para o front montar o menu
#[utoipa::path(
    get,
    path = "/api/users/me/permissions",
    tag = "Users",
    responses((status = 200, body = Vec<EffectivePermission>)),
    security(("api_jwt" = []))
)]
pub async fn get_my_permissions(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<EffectivePermission>>, AppError> {
    let permissions = app_state.rbac_service.effective_permissions(user.id).await?;
    Ok(Json(permissions))
}

// Upload de avatar: multipart com um campo "file"
pub async fn upload_avatar(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut uploaded_url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart inválido: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("avatar").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Falha ao ler o arquivo: {e}")))?;

        let url = app_state
            .media_storage
            .upload(bytes.to_vec(), &filename)
            .await?;
        uploaded_url = Some(url);
    }

    let url =
        uploaded_url.ok_or_else(|| AppError::BadRequest("Campo 'file' ausente.".to_string()))?;

    app_state.user_repo.set_avatar_url(user.id, &url).await?;

    Ok(Json(json!({ "avatarUrl": url })))
}

// Passo 1 do 2FA: gera o segredo e devolve a URL para o QR code
pub async fn setup_two_factor(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<TwoFactorSetupResponse>, AppError> {
    let setup = app_state.auth_service.setup_two_factor(&user).await?;
    Ok(Json(setup))
}

// Passo 2: o usuário confirma com um código do aplicativo autenticador
pub async fn enable_two_factor(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<EnableTwoFactorPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .auth_service
        .enable_two_factor(&user, &payload.code)
        .await?;

    Ok(Json(
        json!({ "message": "Autenticação em duas etapas habilitada." }),
    ))
}
