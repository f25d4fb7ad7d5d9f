// src/handlers/sales.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
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
    middleware::rbac::{PermSalesRead, PermSalesWrite, RequirePermission},
    middleware::tenancy::TenantContext,
    models::activity::ActivityAction,
    models::sales::{
        CreateOrderPayload, OrderDetail, OrderFilter, OrderRow, TransitionOrderPayload,
    },
};

const MODULE: &str = "Sales";

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Sales",
    params(
        PageParams,
        OrderFilter,
        ("x-tenant-id" = String, Header, description = "Loja (UUID ou subdomínio)")
    ),
    responses((status = 200, description = "Página de pedidos", body = Paginated<OrderRow>)),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSalesRead>,
    Query(params): Query<PageParams>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Paginated<OrderRow>>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let per_page = params.per_page();
    let (items, total, page) = app_state
        .sales_service
        .list(
            &mut rls_conn,
            &params.search(),
            filter.status,
            filter.from,
            filter.to,
            params.page(),
            per_page,
        )
        .await?;

    Ok(Json(Paginated::new(items, total, page, per_page)))
}

pub async fn get_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSalesRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let detail = app_state.sales_service.detail(&mut rls_conn, id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Sales",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado com estoque debitado", body = OrderDetail),
        (status = 409, description = "Estoque insuficiente para algum item")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSalesWrite>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let detail = app_state
        .sales_service
        .create_order(&mut rls_conn, tenant.tenant_id, &payload)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Created,
            MODULE,
            Some(detail.order.id),
        )
        .await?;
    rls_conn.commit().await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

// Troca de status respeitando a máquina de estados do pedido
#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    tag = "Sales",
    request_body = TransitionOrderPayload,
    responses(
        (status = 200, description = "Status atualizado", body = OrderRow),
        (status = 409, description = "Transição não permitida")
    ),
    security(("api_jwt" = []))
)]
pub async fn transition_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSalesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionOrderPayload>,
) -> Result<Json<OrderRow>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let order = app_state
        .sales_service
        .transition(&mut rls_conn, id, payload.status)
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

    Ok(Json(order))
}

pub async fn export_orders_csv(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSalesRead>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let bytes = app_state
        .sales_service
        .export_csv(&mut rls_conn, filter.status, filter.from, filter.to)
        .await?;

    let filename = format!("orders_{}.csv", chrono::Utc::now().format("%Y-%m"));
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes))
}

// Nota do pedido em PDF (gerada em memória, nada vai para o disco)
pub async fn order_invoice_pdf(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermSalesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tenant_row = app_state
        .tenant_repo
        .find_by_id(tenant.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("loja".into()))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let bytes = app_state
        .sales_service
        .invoice_pdf(&mut rls_conn, &tenant_row.name, id)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"order_{id}.pdf\""),
        ),
    ];
    Ok((headers, bytes))
}
