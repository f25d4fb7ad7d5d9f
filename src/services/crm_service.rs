// src/services/crm_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::crm::{Customer, CustomerPayload},
};

#[derive(Clone)]
pub struct CrmService {
    customer_repo: CustomerRepository,
}

impl CrmService {
    pub fn new(customer_repo: CustomerRepository) -> Self {
        Self { customer_repo }
    }

    pub async fn list(
        &self,
        conn: &mut sqlx::PgConnection,
        search: &str,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<Customer>, i64, i64), AppError> {
        self.customer_repo.list(conn, search, page, per_page).await
    }

    pub async fn get(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
    ) -> Result<Customer, AppError> {
        self.customer_repo.find_by_id(conn, id).await
    }

    pub async fn create(
        &self,
        conn: &mut sqlx::PgConnection,
        tenant_id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError> {
        self.customer_repo.create(conn, tenant_id, payload).await
    }

    pub async fn update(
        &self,
        conn: &mut sqlx::PgConnection,
        id: Uuid,
        payload: &CustomerPayload,
    ) -> Result<Customer, AppError> {
        self.customer_repo.update(conn, id, payload).await
    }

    pub async fn delete(&self, conn: &mut sqlx::PgConnection, id: Uuid) -> Result<(), AppError> {
        self.customer_repo.delete(conn, id).await
    }
}
