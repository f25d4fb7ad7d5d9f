// src/services/mod.rs

pub mod auth;
pub mod crm_service;
pub mod email;
pub mod hr_service;
pub mod inventory_service;
pub mod media;
pub mod notifier;
pub mod rbac_service;
pub mod report_service;
pub mod sales_service;
pub mod tenancy_service;
