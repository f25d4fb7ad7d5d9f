// src/handlers/notifications.rs
//
// Notificações persistidas + canal realtime por SSE. A sala é escolhida pela
// sessão: Super Admin ouve a sala global, sessões de loja ouvem a da loja.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
    response::sse::{Event, KeepAlive, Sse},
};
use serde_json::json;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::{AuthenticatedUser, SessionClaims},
    models::auth::SessionKind,
    models::notification::Notification,
};

const LIST_LIMIT: i64 = 50;

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    responses((status = 200, description = "Últimas notificações da sessão", body = Vec<Notification>)),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    claims: SessionClaims,
) -> Result<Json<Vec<Notification>>, AppError> {
    // Sala global (tenant_id nulo) para Super Admin, sala da loja para o resto
    let tenant_id = match claims.kind() {
        SessionKind::SuperAdmin => None,
        SessionKind::Tenant(tenant_id)
        | SessionKind::Impersonated { tenant_id, .. } => Some(tenant_id),
    };

    let notifications = app_state
        .notification_repo
        .list_for_user(tenant_id, user.id, LIST_LIMIT)
        .await?;

    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.notification_repo.mark_read(id, user.id).await?;
    Ok(Json(json!({ "message": "Notificação marcada como lida." })))
}

// Stream SSE: cada evento publicado na sala vira um `data: {...}` no cliente
pub async fn notification_stream(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    claims: SessionClaims,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = match claims.kind() {
        SessionKind::SuperAdmin => app_state.notifier.subscribe_admin(),
        SessionKind::Tenant(tenant_id)
        | SessionKind::Impersonated { tenant_id, .. } => {
            app_state.notifier.subscribe_tenant(tenant_id).await
        }
    };

    let stream = BroadcastStream::new(receiver).filter_map(|event| {
        // Lagged (receptor lento estourou o buffer) é ignorado; o cliente
        // ressincroniza pelo GET /api/notifications
        let event = event.ok()?;
        let json = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event("notification").data(json)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
