// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    common::pagination,
    models::auth::{User, UserStatus},
    models::hr::UpdateEmployeePayload,
};

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Busca por e-mail dentro de uma loja OU entre os Super Admins (tenant nulo).
    pub async fn find_by_email(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE lower(email) = lower($2)
              AND (($1::uuid IS NULL AND tenant_id IS NULL) OR tenant_id = $1)
            "#,
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// O admin "canônico" de uma loja: o usuário ativo mais antigo com o
    /// cargo "Administrador" (provisionado na criação da loja). Usado na
    /// personificação. O JOIN em roles passa pelo RLS, então a conexão
    /// precisa vir com o app.tenant_id da loja.
    pub async fn find_tenant_admin<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN user_roles ur ON ur.user_id = u.id
            JOIN roles r ON r.id = ur.role_id
            WHERE u.tenant_id = $1
              AND u.status = 'Active'
              AND r.name = 'Administrador'
            ORDER BY u.created_at ASC
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    pub async fn list_employees(
        &self,
        tenant_id: Uuid,
        search: &str,
        department_id: Option<Uuid>,
        status: Option<UserStatus>,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<User>, i64, i64), AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE tenant_id = $1
              AND ($2 = '' OR username ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
              AND ($3::uuid IS NULL OR department_id = $3)
              AND ($4::user_status IS NULL OR status = $4)
            "#,
        )
        .bind(tenant_id)
        .bind(search)
        .bind(department_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let page = pagination::clamp_page(page, total, per_page);

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE tenant_id = $1
              AND ($2 = '' OR username ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
              AND ($3::uuid IS NULL OR department_id = $3)
              AND ($4::user_status IS NULL OR status = $4)
            ORDER BY created_at DESC, id
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(tenant_id)
        .bind(search)
        .bind(department_id)
        .bind(status)
        .bind(per_page)
        .bind(pagination::offset(page, per_page))
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total, page))
    }

    /// Mapa e-mail -> id dos funcionários da loja (import CSV de presença)
    pub async fn find_ids_by_emails(
        &self,
        tenant_id: Uuid,
        emails: &[String],
    ) -> Result<Vec<(String, Uuid)>, AppError> {
        let rows = sqlx::query_as::<_, (String, Uuid)>(
            r#"
            SELECT lower(email), id FROM users
            WHERE tenant_id = $1 AND lower(email) = ANY($2)
            "#,
        )
        .bind(tenant_id)
        .bind(emails)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_active_employees(&self, tenant_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE tenant_id = $1 AND status = 'Active' ORDER BY username",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // ---
    // Escrita
    // ---

    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        tenant_id: Option<Uuid>,
        username: &str,
        email: &str,
        password_hash: &str,
        status: UserStatus,
        is_super_admin: bool,
        email_verified: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (tenant_id, username, email, password_hash, status, is_super_admin, email_verified)
            VALUES ($1, $2, lower($3), $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(status)
        .bind(is_super_admin)
        .bind(email_verified)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::EmailAlreadyExists;
                }
            }
            e.into()
        })
    }

    pub async fn update_employee<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        payload: &UpdateEmployeePayload,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                username = $3,
                department_id = $4,
                basic_salary = $5,
                bank_name = $6,
                bank_account = $7,
                status = $8,
                updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(&payload.username)
        .bind(payload.department_id)
        .bind(payload.basic_salary)
        .bind(&payload.bank_name)
        .bind(&payload.bank_account)
        .bind(payload.status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::UserNotFound)
    }

    pub async fn delete_employee<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(user_id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    pub async fn set_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_email_verified(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_avatar_url(&self, user_id: Uuid, url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET avatar_url = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Guarda o segredo TOTP do setup; o 2FA só liga depois da confirmação.
    pub async fn set_totp_secret(&self, user_id: Uuid, secret: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET totp_secret = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(secret)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn enable_two_factor(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET two_factor_enabled = TRUE, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn criar_usuario_nao_confunde_verificacao_com_super_admin(pool: sqlx::PgPool) {
        let repo = UserRepository::new(pool.clone());

        let loja: Uuid = sqlx::query_scalar(
            "INSERT INTO tenants (name, subdomain) VALUES ('Acme', 'acme') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        // Funcionária comum com e-mail já confirmado: verified sem ser admin
        let user = repo
            .create_user(
                &pool,
                Some(loja),
                "Maria",
                "maria@acme.com",
                "hash",
                UserStatus::Active,
                false,
                true,
            )
            .await
            .unwrap();

        assert!(user.email_verified);
        assert!(!user.is_super_admin);
    }
}
