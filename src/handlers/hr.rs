// src/handlers/hr.rs
//
// Módulo de RH: funcionários, departamentos, presença e folha de pagamento.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::db_utils::get_rls_connection,
    common::error::AppError,
    common::pagination::{PageParams, Paginated},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    middleware::rbac::{
        PermAttendanceRead, PermAttendanceWrite, PermDepartmentsRead, PermDepartmentsWrite,
        PermEmployeesRead, PermEmployeesWrite, PermPayrollRead, PermPayrollWrite,
        RequirePermission,
    },
    middleware::tenancy::TenantContext,
    models::activity::ActivityAction,
    models::auth::User,
    models::hr::{
        AttendanceFilter, AttendanceRecord, Department, DepartmentPayload, EmployeeFilter,
        GeneratePayrollPayload, MarkAttendancePayload, Payslip, PayslipFilter,
        UpdateEmployeePayload,
    },
};

use crate::services::hr_service::attendance_filename;

// ---
// Funcionários
// ---

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "HR",
    params(
        PageParams,
        EmployeeFilter,
        ("x-tenant-id" = String, Header, description = "Loja (UUID ou subdomínio)")
    ),
    responses((status = 200, description = "Página de funcionários", body = Paginated<User>)),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeesRead>,
    Query(params): Query<PageParams>,
    Query(filter): Query<EmployeeFilter>,
) -> Result<Json<Paginated<User>>, AppError> {
    let per_page = params.per_page();
    let (items, total, page) = app_state
        .user_repo
        .list_employees(
            tenant.tenant_id,
            &params.search(),
            filter.department_id,
            filter.status,
            params.page(),
            per_page,
        )
        .await?;

    Ok(Json(Paginated::new(items, total, page, per_page)))
}

pub async fn get_employee(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeesRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let employee = app_state
        .user_repo
        .find_by_id(id)
        .await?
        .filter(|u| u.tenant_id == Some(tenant.tenant_id))
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(employee))
}

pub async fn update_employee(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeePayload>,
) -> Result<Json<User>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let employee = app_state
        .user_repo
        .update_employee(&mut *rls_conn, tenant.tenant_id, id, &payload)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Updated,
            "Employees",
            Some(id),
        )
        .await?;
    rls_conn.commit().await?;

    Ok(Json(employee))
}

pub async fn delete_employee(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeesWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    app_state
        .user_repo
        .delete_employee(&mut *rls_conn, tenant.tenant_id, id)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Deleted,
            "Employees",
            Some(id),
        )
        .await?;
    rls_conn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

// O alvo precisa ser funcionário DESTA loja antes de mexer em cargo ou
// permissão, senão um gerente atribuiria acesso a gente de outra loja.
async fn ensure_employee_of_tenant(
    app_state: &AppState,
    tenant_id: Uuid,
    employee_id: Uuid,
) -> Result<(), AppError> {
    app_state
        .user_repo
        .find_by_id(employee_id)
        .await?
        .filter(|u| u.tenant_id == Some(tenant_id))
        .ok_or(AppError::UserNotFound)?;
    Ok(())
}

// Atribuição de cargos e exceções de permissão de um funcionário
pub async fn set_employee_roles(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<crate::models::rbac::SetRolesPayload>,
) -> Result<impl IntoResponse, AppError> {
    ensure_employee_of_tenant(&app_state, tenant.tenant_id, id).await?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    app_state
        .rbac_service
        .set_user_roles(&mut rls_conn, tenant.tenant_id, id, &payload.role_ids)
        .await?;
    rls_conn.commit().await?;
    Ok(Json(json!({ "message": "Cargos atualizados." })))
}

pub async fn set_employee_overrides(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeesWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<crate::models::rbac::SetOverridesPayload>,
) -> Result<impl IntoResponse, AppError> {
    ensure_employee_of_tenant(&app_state, tenant.tenant_id, id).await?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    app_state
        .rbac_service
        .set_overrides(&mut rls_conn, id, &payload.overrides)
        .await?;
    rls_conn.commit().await?;
    Ok(Json(json!({ "message": "Exceções de permissão atualizadas." })))
}

pub async fn get_employee_permissions(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEmployeesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ensure_employee_of_tenant(&app_state, tenant.tenant_id, id).await?;

    let permissions = app_state.rbac_service.effective_permissions(id).await?;
    Ok(Json(permissions))
}

// ---
// Departamentos
// ---

pub async fn list_departments(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDepartmentsRead>,
) -> Result<Json<Vec<Department>>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let departments = app_state.hr_service.list_departments(&mut rls_conn).await?;
    Ok(Json(departments))
}

pub async fn create_department(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDepartmentsWrite>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let department = app_state
        .hr_service
        .create_department(&mut rls_conn, tenant.tenant_id, &payload)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Created,
            "Departments",
            Some(department.id),
        )
        .await?;
    rls_conn.commit().await?;

    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn update_department(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDepartmentsWrite>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DepartmentPayload>,
) -> Result<Json<Department>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let department = app_state
        .hr_service
        .update_department(&mut rls_conn, id, &payload)
        .await?;
    rls_conn.commit().await?;

    Ok(Json(department))
}

pub async fn delete_department(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermDepartmentsWrite>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    app_state
        .hr_service
        .delete_department(&mut rls_conn, id)
        .await?;
    rls_conn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// Presença
// ---

// Marca (ou corrige) a presença de um funcionário num dia
#[utoipa::path(
    post,
    path = "/api/attendance",
    tag = "HR",
    request_body = MarkAttendancePayload,
    responses((status = 200, description = "Registro gravado (upsert por usuário+data)", body = AttendanceRecord)),
    security(("api_jwt" = []))
)]
pub async fn mark_attendance(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAttendanceWrite>,
    Json(payload): Json<MarkAttendancePayload>,
) -> Result<Json<AttendanceRecord>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let record = app_state
        .hr_service
        .mark_attendance(
            &mut rls_conn,
            tenant.tenant_id,
            payload.user_id,
            payload.date,
            payload.status,
        )
        .await?;
    rls_conn.commit().await?;

    Ok(Json(record))
}

pub async fn list_attendance(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAttendanceRead>,
    Query(params): Query<PageParams>,
    Query(filter): Query<AttendanceFilter>,
) -> Result<Json<Paginated<AttendanceRecord>>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let per_page = params.per_page();
    let (items, total, page) = app_state
        .hr_service
        .list_attendance(
            &mut rls_conn,
            filter.user_id,
            filter.from,
            filter.to,
            params.page(),
            per_page,
        )
        .await?;

    Ok(Json(Paginated::new(items, total, page, per_page)))
}

pub async fn export_attendance_csv(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAttendanceRead>,
    Query(filter): Query<AttendanceFilter>,
) -> Result<impl IntoResponse, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;
    let bytes = app_state
        .hr_service
        .export_attendance_csv(&mut rls_conn, filter.from, filter.to)
        .await?;

    let filename = attendance_filename(chrono::Utc::now());
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, bytes))
}

pub async fn import_attendance_csv(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAttendanceWrite>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
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
    let imported = app_state
        .hr_service
        .import_attendance_csv(&mut rls_conn, tenant.tenant_id, &bytes)
        .await?;
    rls_conn.commit().await?;

    Ok(Json(json!({ "imported": imported })))
}

// ---
// Folha de pagamento
// ---

// Gera os holerites do mês para todos os funcionários ativos
#[utoipa::path(
    post,
    path = "/api/payroll/generate",
    tag = "HR",
    request_body = GeneratePayrollPayload,
    responses(
        (status = 201, description = "Holerites gerados", body = Vec<Payslip>),
        (status = 409, description = "Folha do mês já gerada para algum funcionário")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_payroll(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermPayrollWrite>,
    Json(payload): Json<GeneratePayrollPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let payslips = app_state
        .hr_service
        .generate_payroll(&mut rls_conn, tenant.tenant_id, &payload)
        .await?;

    app_state
        .activity_repo
        .record(
            &mut rls_conn,
            tenant.tenant_id,
            user.0.id,
            ActivityAction::Created,
            "Payroll",
            None,
        )
        .await?;
    rls_conn.commit().await?;

    Ok((StatusCode::CREATED, Json(payslips)))
}

pub async fn list_payslips(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermPayrollRead>,
    Query(params): Query<PageParams>,
    Query(filter): Query<PayslipFilter>,
) -> Result<Json<Paginated<Payslip>>, AppError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user).await?;

    let per_page = params.per_page();
    let (items, total, page) = app_state
        .hr_service
        .list_payslips(
            &mut rls_conn,
            filter.user_id,
            filter.month,
            filter.year,
            params.page(),
            per_page,
        )
        .await?;

    Ok(Json(Paginated::new(items, total, page, per_page)))
}
