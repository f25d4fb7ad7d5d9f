// src/db/auth_code_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::auth::{AuthCode, AuthCodePurpose},
};

#[derive(Clone)]
pub struct AuthCodeRepository {
    pool: PgPool,
}

impl AuthCodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Emite um novo código invalidando os anteriores do mesmo propósito.
    pub async fn issue(
        &self,
        user_id: Uuid,
        purpose: AuthCodePurpose,
        code: &str,
        ttl_minutes: i64,
    ) -> Result<AuthCode, AppError> {
        sqlx::query(
            r#"
            UPDATE auth_codes SET consumed_at = now()
            WHERE user_id = $1 AND purpose = $2 AND consumed_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .execute(&self.pool)
        .await?;

        let auth_code = sqlx::query_as::<_, AuthCode>(
            r#"
            INSERT INTO auth_codes (user_id, purpose, code, expires_at)
            VALUES ($1, $2, $3, now() + ($4 || ' minutes')::interval)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .bind(code)
        .bind(ttl_minutes.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(auth_code)
    }

    /// Consome o código se ele for o ativo, não expirado e bater com o
    /// enviado. Retorna erro genérico em qualquer outro caso.
    pub async fn consume(
        &self,
        user_id: Uuid,
        purpose: AuthCodePurpose,
        code: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE auth_codes SET consumed_at = now()
            WHERE user_id = $1
              AND purpose = $2
              AND code = $3
              AND consumed_at IS NULL
              AND expires_at > now()
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .bind(code)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidAuthCode);
        }
        Ok(())
    }
}
