pub mod activity;
pub mod auth;
pub mod crm;
pub mod hr;
pub mod inventory;
pub mod notification;
pub mod rbac;
pub mod report;
pub mod sales;
pub mod tenancy;
