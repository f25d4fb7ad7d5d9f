// src/handlers/reports.rs

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::db_utils::get_rls_connection,
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    middleware::rbac::{PermReportsRead, RequirePermission},
    middleware::tenancy::TenantContext,
    models::report::ReportSummary,
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// Agregados do dashboard da loja
#[utoipa::path(
    get,
    path = "/api/reports/summary",
    tag = "Reports",
    params(("x-tenant-id" = String, Header, description = "Loja (UUID ou subdomínio)")),
    responses((status = 200, description = "Resumo do dashboard", body = ReportSummary)),
    security(("api_jwt" = []))
)]
pub async fn summary(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermReportsRead>,
) -> Result<Json<ReportSummary>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let summary = app_state.report_service.summary(&mut rls_conn).await?;
    Ok(Json(summary))
}

// Relatório de vendas do período, em PDF
pub async fn sales_pdf(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermReportsRead>,
    Query(period): Query<ReportPeriod>,
) -> Result<impl IntoResponse, AppError> {
    let tenant_row = app_state
        .tenant_repo
        .find_by_id(tenant.tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("loja".into()))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let bytes = app_state
        .report_service
        .sales_pdf(&mut rls_conn, &tenant_row.name, period.from, period.to)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"sales_report.pdf\"".to_string(),
        ),
    ];
    Ok((headers, bytes))
}

// A mesma visão do relatório, em CSV
pub async fn sales_csv(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermReportsRead>,
    Query(period): Query<ReportPeriod>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let bytes = app_state
        .sales_service
        .export_csv(&mut rls_conn, None, period.from, period.to)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"sales_report.csv\"".to_string(),
        ),
    ];
    Ok((headers, bytes))
}
