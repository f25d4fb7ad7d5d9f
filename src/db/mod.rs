// src/db/mod.rs

pub mod activity_repo;
pub mod auth_code_repo;
pub mod crm_repo;
pub mod hr_repo;
pub mod inventory_repo;
pub mod notification_repo;
pub mod rbac_repo;
pub mod sales_repo;
pub mod tenancy_repo;
pub mod user_repo;

pub use activity_repo::ActivityRepository;
pub use auth_code_repo::AuthCodeRepository;
pub use crm_repo::CustomerRepository;
pub use hr_repo::HrRepository;
pub use inventory_repo::ProductRepository;
pub use notification_repo::NotificationRepository;
pub use rbac_repo::RbacRepository;
pub use sales_repo::OrderRepository;
pub use tenancy_repo::TenantRepository;
pub use user_repo::UserRepository;
