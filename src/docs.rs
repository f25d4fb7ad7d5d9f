// src/docs.rs

use crate::handlers;
use crate::models;
use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::verify_email,
        handlers::auth::login,
        handlers::auth::login_two_factor,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,

        // --- Users ---
        handlers::users::get_me,
        handlers::users::get_my_permissions,

        // --- Inventory ---
        handlers::inventory::list_products,
        handlers::inventory::create_product,
        handlers::inventory::import_products_csv,

        // --- Customers ---
        handlers::crm::list_customers,

        // --- Sales ---
        handlers::sales::list_orders,
        handlers::sales::create_order,
        handlers::sales::transition_order,

        // --- HR ---
        handlers::hr::list_employees,
        handlers::hr::mark_attendance,
        handlers::hr::generate_payroll,

        // --- Roles ---
        handlers::rbac::list_permissions,
        handlers::rbac::list_roles,

        // --- Reports ---
        handlers::reports::summary,

        // --- Activity ---
        handlers::activity::list_activity,

        // --- Notifications ---
        handlers::notifications::list_notifications,

        // --- Admin ---
        handlers::tenancy::list_tenants,
        handlers::tenancy::create_tenant,
        handlers::tenancy::tenant_detail,
        handlers::tenancy::impersonate_tenant,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserStatus,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::LoginTwoFactorPayload,
            models::auth::VerifyEmailPayload,
            models::auth::ForgotPasswordPayload,
            models::auth::ResetPasswordPayload,
            models::auth::EnableTwoFactorPayload,
            models::auth::AuthResponse,
            handlers::users::ProfileResponse,
            models::auth::TwoFactorRequiredResponse,
            models::auth::TwoFactorSetupResponse,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::PermissionSource,
            models::rbac::EffectivePermission,
            models::rbac::CreateRolePayload,
            models::rbac::RoleResponse,
            models::rbac::SetRolesPayload,
            models::rbac::OverrideEntry,
            models::rbac::SetOverridesPayload,

            // --- Inventory ---
            models::inventory::Product,
            models::inventory::CreateProductPayload,
            models::inventory::UpdateProductPayload,
            models::inventory::CsvImportSummary,

            // --- CRM ---
            models::crm::Customer,
            models::crm::CustomerPayload,

            // --- Sales ---
            models::sales::OrderStatus,
            models::sales::Order,
            models::sales::OrderRow,
            models::sales::OrderItemRow,
            models::sales::OrderDetail,
            models::sales::OrderItemPayload,
            models::sales::CreateOrderPayload,
            models::sales::TransitionOrderPayload,

            // --- HR ---
            models::hr::Department,
            models::hr::DepartmentPayload,
            models::hr::AttendanceStatus,
            models::hr::AttendanceRecord,
            models::hr::MarkAttendancePayload,
            models::hr::Payslip,
            models::hr::GeneratePayrollPayload,
            models::hr::UpdateEmployeePayload,

            // --- Reports ---
            models::report::ReportSummary,

            // --- Activity ---
            models::activity::ActivityAction,
            models::activity::ActivityLogRow,

            // --- Notifications ---
            models::notification::Notification,

            // --- Tenancy ---
            models::tenancy::TenantStatus,
            models::tenancy::Tenant,
            models::tenancy::TenantStats,
            models::tenancy::TenantDetail,
            models::tenancy::CreateTenantPayload,
            models::tenancy::SetTenantStatusPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, 2FA e recuperação de senha"),
        (name = "Users", description = "Perfil e permissões da sessão"),
        (name = "Inventory", description = "Gestão de Produtos e Estoque"),
        (name = "Customers", description = "Gestão de Clientes"),
        (name = "Sales", description = "Gestão de Pedidos"),
        (name = "HR", description = "Funcionários, Presença e Folha de Pagamento"),
        (name = "Roles", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Reports", description = "Dashboard e Relatórios"),
        (name = "Activity", description = "Trilha de Auditoria"),
        (name = "Notifications", description = "Notificações e Realtime"),
        (name = "Admin", description = "Diretório de Lojas (Super Admin)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
