// src/handlers/activity.rs

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    common::db_utils::get_rls_connection,
    common::error::AppError,
    common::pagination::{PageParams, Paginated},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    middleware::rbac::{PermActivityRead, RequirePermission},
    middleware::tenancy::TenantContext,
    models::activity::{ActivityFilter, ActivityLogRow},
};

// Trilha de auditoria da loja (quem fez o quê, em qual módulo)
#[utoipa::path(
    get,
    path = "/api/activity",
    tag = "Activity",
    params(
        PageParams,
        ActivityFilter,
        ("x-tenant-id" = String, Header, description = "Loja (UUID ou subdomínio)")
    ),
    responses((status = 200, description = "Página do log de atividades", body = Paginated<ActivityLogRow>)),
    security(("api_jwt" = []))
)]
pub async fn list_activity(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermActivityRead>,
    Query(params): Query<PageParams>,
    Query(filter): Query<ActivityFilter>,
) -> Result<Json<Paginated<ActivityLogRow>>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let per_page = params.per_page();
    let (items, total, page) = app_state
        .activity_repo
        .list(
            &mut rls_conn,
            filter.user_id,
            filter.module.as_deref(),
            filter.from,
            filter.to,
            params.page(),
            per_page,
        )
        .await?;

    Ok(Json(Paginated::new(items, total, page, per_page)))
}
