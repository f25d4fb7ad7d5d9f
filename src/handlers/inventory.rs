// src/handlers/inventory.rs

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
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
    middleware::rbac::{PermInventoryRead, PermInventoryWrite, RequirePermission},
    middleware::tenancy::TenantContext,
    models::activity::ActivityAction,
    models::inventory::{CreateProductPayload, CsvImportSummary, Product, UpdateProductPayload},
};

use crate::services::inventory_service::export_filename;

const MODULE: &str = "Inventory";

#[utoipa::path(
    get,
    path = "/api/inventory/products",
    tag = "Inventory",
    params(
        PageParams,
        ("x-tenant-id" = String, Header, description = "Loja (UUID ou subdomínio)")
    ),
    responses((status = 200, description = "Página de produtos", body = Paginated<Product>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermInventoryRead>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Product>>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let per_page = params.per_page();
    let (items, total, page) = app_state
        .inventory_service
        .list(&mut rls_conn, &params.search(), params.page(), per_page)
        .await?;

    Ok(Json(Paginated::new(items, total, page, per_page)))
}

pub async fn get_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermInventoryRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let product = app_state.inventory_service.get(&mut rls_conn, id).await?;
    Ok(Json(product))
}

#[utoipa::path(
    post,
    path = "/api/inventory/products",
    tag = "Inventory",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 409, description = "SKU já existente na loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermInventoryWrite>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let product = app_state
        .inventory_service
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
            Some(product.id),
        )
        .await?;
    rls_conn.commit().await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let product = app_state
        .inventory_service
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

    Ok(Json(product))
}

pub async fn delete_product(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermInventoryWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    app_state.inventory_service.delete(&mut rls_conn, id).await?;

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

// Exporta o catálogo inteiro como CSV para download
pub async fn export_products_csv(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let bytes = app_state.inventory_service.export_csv(&mut rls_conn).await?;

    let filename = export_filename(chrono::Utc::now());
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes))
}

// Importa um CSV (multipart, campo "file") fazendo upsert por SKU
#[utoipa::path(
    post,
    path = "/api/inventory/products/import",
    tag = "Inventory",
    responses(
        (status = 200, description = "Resumo do import", body = CsvImportSummary),
        (status = 400, description = "Linha inválida no CSV (nada é gravado)")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_products_csv(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermInventoryWrite>,
    mut multipart: Multipart,
) -> Result<Json<CsvImportSummary>, AppError> {
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart inválido: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Falha ao ler o arquivo: {e}")))?;
            file_bytes = Some(bytes.to_vec());
        }
    }

    let bytes =
        file_bytes.ok_or_else(|| AppError::BadRequest("Campo 'file' ausente.".to_string()))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let summary = app_state
        .inventory_service
        .import_csv(&mut rls_conn, tenant.tenant_id, &bytes)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Updated,
            MODULE,
            None,
        )
        .await?;
    rls_conn.commit().await?;

    Ok(Json(summary))
}

pub async fn low_stock(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermInventoryRead>,
) -> Result<Json<Vec<Product>>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let products = app_state.inventory_service.low_stock(&mut rls_conn).await?;
    Ok(Json(products))
}
