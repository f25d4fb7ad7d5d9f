// src/config.rs

use std::{env, sync::Arc, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{
        ActivityRepository, AuthCodeRepository, CustomerRepository, HrRepository,
        NotificationRepository, OrderRepository, ProductRepository, RbacRepository,
        TenantRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        crm_service::CrmService,
        email::EmailService,
        hr_service::HrService,
        inventory_service::InventoryService,
        media::{CloudinaryStorage, MediaStorage},
        notifier::Notifier,
        rbac_service::RbacService,
        report_service::ReportService,
        sales_service::SalesService,
        tenancy_service::TenantService,
    },
};

// O estado compartilhado da aplicação: pool, repositórios e serviços.
// Tudo aqui é barato de clonar (PgPool e Arcs por dentro).
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,

    // Repositórios (os handlers usam os que não têm camada de serviço)
    pub user_repo: UserRepository,
    pub tenant_repo: TenantRepository,
    pub rbac_repo: RbacRepository,
    pub activity_repo: ActivityRepository,
    pub notification_repo: NotificationRepository,

    // Serviços
    pub auth_service: AuthService,
    pub tenancy_service: TenantService,
    pub rbac_service: RbacService,
    pub inventory_service: InventoryService,
    pub crm_service: CrmService,
    pub sales_service: SalesService,
    pub hr_service: HrService,
    pub report_service: ReportService,

    pub media_storage: Arc<dyn MediaStorage>,
    pub notifier: Notifier,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        let db_pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new();
        let customer_repo = CustomerRepository::new();
        let order_repo = OrderRepository::new();
        let hr_repo = HrRepository::new();
        let activity_repo = ActivityRepository::new();
        let notification_repo = NotificationRepository::new(db_pool.clone());
        let auth_code_repo = AuthCodeRepository::new(db_pool.clone());

        let email_service = EmailService::from_env();
        let notifier = Notifier::new();

        let cloud_name = env::var("CLOUDINARY_CLOUD_NAME").unwrap_or_default();
        let upload_preset = env::var("CLOUDINARY_UPLOAD_PRESET").unwrap_or_default();
        if cloud_name.is_empty() {
            tracing::warn!("CLOUDINARY_CLOUD_NAME ausente; upload de avatar vai falhar");
        }
        let media_storage: Arc<dyn MediaStorage> =
            Arc::new(CloudinaryStorage::new(cloud_name, upload_preset));

        let auth_service = AuthService::new(
            user_repo.clone(),
            tenant_repo.clone(),
            auth_code_repo.clone(),
            notification_repo.clone(),
            email_service,
            notifier.clone(),
            jwt_secret.clone(),
            db_pool.clone(),
        );
        let tenancy_service = TenantService::new(
            tenant_repo.clone(),
            user_repo.clone(),
            rbac_repo.clone(),
            db_pool.clone(),
        );
        let rbac_service = RbacService::new(rbac_repo.clone());
        let inventory_service = InventoryService::new(product_repo.clone());
        let crm_service = CrmService::new(customer_repo.clone());
        let sales_service = SalesService::new(
            order_repo.clone(),
            product_repo.clone(),
            customer_repo.clone(),
        );
        let hr_service = HrService::new(hr_repo.clone(), user_repo.clone());
        let report_service = ReportService::new(product_repo, order_repo);

        Ok(Self {
            db_pool,
            jwt_secret,
            user_repo,
            tenant_repo,
            rbac_repo,
            activity_repo,
            notification_repo,
            auth_service,
            tenancy_service,
            rbac_service,
            inventory_service,
            crm_service,
            sales_service,
            hr_service,
            report_service,
            media_storage,
            notifier,
        })
    }
}
