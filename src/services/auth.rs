// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use sqlx::PgPool;
use totp_rs::{Algorithm, Secret, TOTP};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AuthCodeRepository, NotificationRepository, TenantRepository, UserRepository},
    models::auth::{AuthCodePurpose, Claims, TwoFactorSetupResponse, User, UserStatus},
    models::notification::RealtimeEvent,
    models::tenancy::{Tenant, TenantStatus},
    services::email::EmailService,
    services::notifier::Notifier,
};

const CODE_TTL_MINUTES: i64 = 15;
const TOTP_ISSUER: &str = "ERP";

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    tenant_repo: TenantRepository,
    auth_code_repo: AuthCodeRepository,
    notification_repo: NotificationRepository,
    email_service: EmailService,
    notifier: Notifier,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: UserRepository,
        tenant_repo: TenantRepository,
        auth_code_repo: AuthCodeRepository,
        notification_repo: NotificationRepository,
        email_service: EmailService,
        notifier: Notifier,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            tenant_repo,
            auth_code_repo,
            notification_repo,
            email_service,
            notifier,
            jwt_secret,
            pool,
        }
    }

    async fn active_tenant_by_subdomain(&self, subdomain: &str) -> Result<Tenant, AppError> {
        let tenant = self
            .tenant_repo
            .find_by_subdomain(subdomain)
            .await?
            .ok_or_else(|| AppError::NotFound("loja".into()))?;

        if tenant.status != TenantStatus::Active {
            return Err(AppError::TenantInactive);
        }
        Ok(tenant)
    }

    /// Cadastro sempre entra numa loja, com status Pending até um admin
    /// aprovar. O código de verificação de e-mail sai na sequência.
    pub async fn register_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        tenant_subdomain: &str,
    ) -> Result<User, AppError> {
        let tenant = self.active_tenant_by_subdomain(tenant_subdomain).await?;

        // Hashing fora do executor async (bcrypt é pesado de CPU)
        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let new_user = self
            .user_repo
            .create_user(
                &self.pool,
                Some(tenant.id),
                username,
                email,
                &hashed_password,
                UserStatus::Pending,
                false,
                false,
            )
            .await?;

        self.send_auth_code(&new_user, AuthCodePurpose::VerifyEmail)
            .await?;

        // Avisa a sala da loja que tem cadastro aguardando aprovação
        let message = format!("Novo cadastro aguardando aprovação: {}", new_user.username);
        let notification = self
            .notification_repo
            .insert(
                Some(tenant.id),
                None,
                "new_user_request",
                &message,
                Some("/employees"),
            )
            .await?;
        self.notifier
            .publish_tenant(
                tenant.id,
                RealtimeEvent {
                    event: notification.event.clone(),
                    message: notification.message.clone(),
                    link: notification.link.clone(),
                    created_at: notification.created_at,
                },
            )
            .await;

        // A sala do Super Admin também recebe (notificação global, tenant nulo)
        let admin_message = format!(
            "Novo cadastro na loja {}: {}",
            tenant.name, new_user.username
        );
        let admin_notification = self
            .notification_repo
            .insert(
                None,
                None,
                "new_user_request",
                &admin_message,
                Some("/employees"),
            )
            .await?;
        self.notifier.publish_admin(RealtimeEvent {
            event: admin_notification.event,
            message: admin_notification.message,
            link: admin_notification.link,
            created_at: admin_notification.created_at,
        });

        Ok(new_user)
    }

    async fn send_auth_code(&self, user: &User, purpose: AuthCodePurpose) -> Result<(), AppError> {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.auth_code_repo
            .issue(user.id, purpose, &code, CODE_TTL_MINUTES)
            .await?;

        let subject = match purpose {
            AuthCodePurpose::VerifyEmail => "Confirme seu e-mail",
            AuthCodePurpose::ResetPassword => "Redefinição de senha",
        };
        self.email_service
            .send_code(&user.email, subject, &code)
            .await;
        Ok(())
    }

    pub async fn verify_email(
        &self,
        tenant_subdomain: &str,
        email: &str,
        code: &str,
    ) -> Result<(), AppError> {
        let tenant = self.active_tenant_by_subdomain(tenant_subdomain).await?;
        let user = self
            .user_repo
            .find_by_email(Some(tenant.id), email)
            .await?
            .ok_or(AppError::InvalidAuthCode)?;

        self.auth_code_repo
            .consume(user.id, AuthCodePurpose::VerifyEmail, code)
            .await?;
        self.user_repo.set_email_verified(user.id).await
    }

    /// Primeira etapa do login. Com 2FA habilitado nenhum token é emitido:
    /// retorna Ok(None) e o front manda a segunda submissão com o código.
    pub async fn login_user(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
        password: &str,
    ) -> Result<Option<(String, User)>, AppError> {
        let user = self.check_credentials(tenant_id, email, password).await?;

        if user.two_factor_enabled {
            return Ok(None);
        }

        let token = self.create_token(&user, None)?;
        Ok(Some((token, user)))
    }

    /// Segunda etapa do login com 2FA: credenciais de novo mais o código
    /// do aplicativo autenticador.
    pub async fn login_two_factor(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
        password: &str,
        code: &str,
    ) -> Result<(String, User), AppError> {
        let user = self.check_credentials(tenant_id, email, password).await?;

        let secret = user
            .totp_secret
            .as_deref()
            .ok_or(AppError::InvalidTotpCode)?;
        if !self.verify_totp(secret, &user.email, code)? {
            return Err(AppError::InvalidTotpCode);
        }

        let token = self.create_token(&user, None)?;
        Ok((token, user))
    }

    async fn check_credentials(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let user = self
            .user_repo
            .find_by_email(tenant_id, email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        if user.status != UserStatus::Active {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Emite o token de personificação: o sub vira o admin da loja alvo e a
    /// claim `imp` guarda quem é o Super Admin de verdade.
    pub async fn impersonate(
        &self,
        super_admin: &User,
        tenant_id: Uuid,
    ) -> Result<(String, User), AppError> {
        if !super_admin.is_super_admin {
            return Err(AppError::SuperAdminOnly);
        }

        let tenant = self
            .tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("loja".into()))?;
        if tenant.status != TenantStatus::Active {
            return Err(AppError::TenantInactive);
        }

        // O cargo "Administrador" fica atrás do RLS da tabela roles
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
            .bind(tenant.id.to_string())
            .execute(&mut *tx)
            .await?;
        let admin = self
            .user_repo
            .find_tenant_admin(&mut *tx, tenant.id)
            .await?
            .ok_or_else(|| AppError::NotFound("administrador da loja".into()))?;

        let token = self.create_token(&admin, Some(super_admin.id))?;
        Ok((token, admin))
    }

    /// Provisiona o primeiro Super Admin a partir do ambiente. Idempotente:
    /// se o e-mail já existe entre os Super Admins, não faz nada.
    pub async fn bootstrap_super_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(), AppError> {
        if self.user_repo.find_by_email(None, email).await?.is_some() {
            tracing::info!("Super Admin {email} já existe; bootstrap ignorado");
            return Ok(());
        }

        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        self.user_repo
            .create_user(
                &self.pool,
                None,
                "Super Admin",
                email,
                &hashed_password,
                UserStatus::Active,
                true,
                true,
            )
            .await?;

        tracing::info!("Super Admin {email} provisionado");
        Ok(())
    }

    pub async fn forgot_password(
        &self,
        tenant_subdomain: &str,
        email: &str,
    ) -> Result<(), AppError> {
        let tenant = self.active_tenant_by_subdomain(tenant_subdomain).await?;

        // E-mail desconhecido responde 200 do mesmo jeito (não vaza cadastro)
        if let Some(user) = self.user_repo.find_by_email(Some(tenant.id), email).await? {
            self.send_auth_code(&user, AuthCodePurpose::ResetPassword)
                .await?;
        }
        Ok(())
    }

    pub async fn reset_password(
        &self,
        tenant_subdomain: &str,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let tenant = self.active_tenant_by_subdomain(tenant_subdomain).await?;
        let user = self
            .user_repo
            .find_by_email(Some(tenant.id), email)
            .await?
            .ok_or(AppError::InvalidAuthCode)?;

        self.auth_code_repo
            .consume(user.id, AuthCodePurpose::ResetPassword, code)
            .await?;

        let password_clone = new_password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        self.user_repo.set_password(user.id, &hashed_password).await
    }

    // ---
    // 2FA
    // ---

    /// Gera e guarda o segredo TOTP. O 2FA só é de fato habilitado depois
    /// que o usuário confirma um código válido em enable_two_factor.
    pub async fn setup_two_factor(&self, user: &User) -> Result<TwoFactorSetupResponse, AppError> {
        let secret = Secret::generate_secret();
        let secret_b32 = secret.to_encoded().to_string();

        let totp = self.build_totp(&secret_b32, &user.email)?;
        let otpauth_url = totp.get_url();

        self.user_repo.set_totp_secret(user.id, &secret_b32).await?;

        Ok(TwoFactorSetupResponse {
            secret: secret_b32,
            otpauth_url,
        })
    }

    pub async fn enable_two_factor(&self, user: &User, code: &str) -> Result<(), AppError> {
        let secret = user
            .totp_secret
            .as_deref()
            .ok_or(AppError::InvalidTotpCode)?;

        if !self.verify_totp(secret, &user.email, code)? {
            return Err(AppError::InvalidTotpCode);
        }
        self.user_repo.enable_two_factor(user.id).await
    }

    fn build_totp(&self, secret_b32: &str, account: &str) -> Result<TOTP, AppError> {
        let secret_bytes = Secret::Encoded(secret_b32.to_string())
            .to_bytes()
            .map_err(|e| anyhow::anyhow!("Segredo TOTP inválido: {e:?}"))?;

        TOTP::new(
            Algorithm::SHA1,
            6,
            1,
            30,
            secret_bytes,
            Some(TOTP_ISSUER.to_string()),
            account.to_string(),
        )
        .map_err(|e| anyhow::anyhow!("Falha ao montar TOTP: {e}").into())
    }

    fn verify_totp(&self, secret_b32: &str, account: &str, code: &str) -> Result<bool, AppError> {
        let totp = self.build_totp(secret_b32, account)?;
        totp.check_current(code)
            .map_err(|e| anyhow::anyhow!("Relógio do sistema: {e}").into())
    }

    // ---
    // Tokens
    // ---

    pub async fn validate_token(&self, token: &str) -> Result<(User, Claims), AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.status != UserStatus::Active {
            return Err(AppError::InvalidToken);
        }

        Ok((user, token_data.claims))
    }

    fn create_token(&self, user: &User, impersonated_by: Option<Uuid>) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user.id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            tenant_id: user.tenant_id,
            imp: impersonated_by,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(pool: PgPool) -> AuthService {
        AuthService::new(
            UserRepository::new(pool.clone()),
            TenantRepository::new(pool.clone()),
            AuthCodeRepository::new(pool.clone()),
            NotificationRepository::new(pool.clone()),
            EmailService::from_env(),
            Notifier::new(),
            "segredo-de-teste".into(),
            pool,
        )
    }

    #[sqlx::test]
    async fn bootstrap_do_super_admin_e_idempotente(pool: PgPool) {
        let auth = service(pool.clone());

        auth.bootstrap_super_admin("root@erp.com", "senha-forte")
            .await
            .unwrap();
        // Rodar de novo (ex.: reinício do servidor) não duplica nem falha
        auth.bootstrap_super_admin("root@erp.com", "outra-senha")
            .await
            .unwrap();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE is_super_admin AND lower(email) = 'root@erp.com'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(total, 1);
    }
}
