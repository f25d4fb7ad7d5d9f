//src/main.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;
use crate::middleware::tenancy::tenant_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger, que movemos para o main.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Sem um Super Admin o /api/admin fica inalcançável; o primeiro vem do
    // ambiente e as execuções seguintes são no-op
    if let (Ok(email), Ok(password)) = (
        std::env::var("SUPER_ADMIN_EMAIL"),
        std::env::var("SUPER_ADMIN_PASSWORD"),
    ) {
        app_state
            .auth_service
            .bootstrap_super_admin(&email, &password)
            .await
            .expect("Falha ao provisionar o Super Admin inicial.");
    }

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/verify-email", post(handlers::auth::verify_email))
        .route("/login", post(handlers::auth::login))
        .route("/login/2fa", post(handlers::auth::login_two_factor))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password));

    // Rotas do usuário logado (só auth_guard; valem para qualquer tipo de sessão)
    let user_routes = Router::new()
        .route("/me", get(handlers::users::get_me))
        .route("/me/permissions", get(handlers::users::get_my_permissions))
        .route("/me/avatar", post(handlers::users::upload_avatar))
        .route("/me/2fa/setup", post(handlers::users::setup_two_factor))
        .route("/me/2fa/enable", post(handlers::users::enable_two_factor));

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::list_notifications))
        .route(
            "/{id}/read",
            post(handlers::notifications::mark_notification_read),
        )
        .route("/stream", get(handlers::notifications::notification_stream));

    // --- Módulos de loja (auth_guard + tenant_guard) ---

    let inventory_routes = Router::new()
        .route(
            "/products",
            post(handlers::inventory::create_product).get(handlers::inventory::list_products),
        )
        .route(
            "/products/{id}",
            get(handlers::inventory::get_product)
                .put(handlers::inventory::update_product)
                .delete(handlers::inventory::delete_product),
        )
        .route("/products/export", get(handlers::inventory::export_products_csv))
        .route("/products/import", post(handlers::inventory::import_products_csv))
        .route("/products/low-stock", get(handlers::inventory::low_stock));

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::crm::create_customer).get(handlers::crm::list_customers),
        )
        .route(
            "/{id}",
            get(handlers::crm::get_customer)
                .put(handlers::crm::update_customer)
                .delete(handlers::crm::delete_customer),
        );

    let order_routes = Router::new()
        .route(
            "/",
            post(handlers::sales::create_order).get(handlers::sales::list_orders),
        )
        .route("/export", get(handlers::sales::export_orders_csv))
        .route("/{id}", get(handlers::sales::get_order))
        .route("/{id}/status", patch(handlers::sales::transition_order))
        .route("/{id}/invoice.pdf", get(handlers::sales::order_invoice_pdf));

    let employee_routes = Router::new()
        .route("/", get(handlers::hr::list_employees))
        .route(
            "/{id}",
            get(handlers::hr::get_employee)
                .put(handlers::hr::update_employee)
                .delete(handlers::hr::delete_employee),
        )
        .route("/{id}/roles", put(handlers::hr::set_employee_roles))
        .route("/{id}/overrides", put(handlers::hr::set_employee_overrides))
        .route(
            "/{id}/permissions",
            get(handlers::hr::get_employee_permissions),
        );

    let department_routes = Router::new()
        .route(
            "/",
            post(handlers::hr::create_department).get(handlers::hr::list_departments),
        )
        .route(
            "/{id}",
            put(handlers::hr::update_department).delete(handlers::hr::delete_department),
        );

    let attendance_routes = Router::new()
        .route(
            "/",
            post(handlers::hr::mark_attendance).get(handlers::hr::list_attendance),
        )
        .route("/export", get(handlers::hr::export_attendance_csv))
        .route("/import", post(handlers::hr::import_attendance_csv));

    let payroll_routes = Router::new()
        .route("/", get(handlers::hr::list_payslips))
        .route("/generate", post(handlers::hr::generate_payroll));

    let role_routes = Router::new()
        .route(
            "/",
            post(handlers::rbac::create_role).get(handlers::rbac::list_roles),
        )
        .route(
            "/{id}",
            put(handlers::rbac::update_role).delete(handlers::rbac::delete_role),
        );

    let report_routes = Router::new()
        .route("/summary", get(handlers::reports::summary))
        .route("/sales.pdf", get(handlers::reports::sales_pdf))
        .route("/sales.csv", get(handlers::reports::sales_csv));

    let activity_routes = Router::new().route("/", get(handlers::activity::list_activity));

    let tenant_modules = Router::new()
        .nest("/inventory", inventory_routes)
        .nest("/customers", customer_routes)
        .nest("/orders", order_routes)
        .nest("/employees", employee_routes)
        .nest("/departments", department_routes)
        .nest("/attendance", attendance_routes)
        .nest("/payroll", payroll_routes)
        .nest("/roles", role_routes)
        .nest("/reports", report_routes)
        .nest("/activity", activity_routes)
        .route("/permissions", get(handlers::rbac::list_permissions))
        // tenant_guard depende das extensões do auth_guard, então a camada
        // de auth fica por fora (camadas rodam de fora para dentro)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    // Diretório de lojas do Super Admin
    let admin_routes = Router::new()
        .route(
            "/tenants",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_tenants),
        )
        .route("/tenants/{id}", get(handlers::tenancy::tenant_detail))
        .route(
            "/tenants/{id}/status",
            patch(handlers::tenancy::set_tenant_status),
        )
        .route(
            "/tenants/{id}/impersonate",
            post(handlers::tenancy::impersonate_tenant),
        );

    // Tudo que não é público passa pelo auth_guard
    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api", tenant_modules)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .merge(protected)
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
        .with_state(app_state);

    // Inicia o servidor
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
