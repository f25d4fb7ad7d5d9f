pub mod activity;
pub mod auth;
pub mod crm;
pub mod hr;
pub mod inventory;
pub mod notifications;
pub mod rbac;
pub mod reports;
pub mod sales;
pub mod tenancy;
pub mod users;
