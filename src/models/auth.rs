// src/models/auth.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Status de conta: Pending aguarda aprovação de um admin da loja.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_status")]
pub enum UserStatus {
    Pending,
    Active,
    Inactive,
    Terminated,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Nulo para contas de Super Admin
    pub tenant_id: Option<Uuid>,

    pub username: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    pub avatar_url: Option<String>,
    pub department_id: Option<Uuid>,

    #[schema(value_type = f64, example = 3500.0)]
    pub basic_salary: Decimal,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,

    pub status: UserStatus,
    pub email_verified: bool,
    pub two_factor_enabled: bool,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub totp_secret: Option<String>,

    pub is_super_admin: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // Subject (ID do usuário)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued At
    /// Loja da sessão; None = sessão de Super Admin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<Uuid>,
    /// Preenchido durante personificação: o ID do Super Admin original
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imp: Option<Uuid>,
}

/// O tipo de sessão, derivado das claims. Substitui o "estado global de
/// sessão" por transições explícitas: cada request resolve exatamente um.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Tenant(Uuid),
    SuperAdmin,
    Impersonated { tenant_id: Uuid, original_admin: Uuid },
}

impl Claims {
    pub fn session_kind(&self) -> SessionKind {
        match (self.tenant_id, self.imp) {
            (Some(tenant_id), Some(original_admin)) => SessionKind::Impersonated {
                tenant_id,
                original_admin,
            },
            (Some(tenant_id), None) => SessionKind::Tenant(tenant_id),
            (None, _) => SessionKind::SuperAdmin,
        }
    }
}

// Destino de um código de 6 dígitos enviado por e-mail
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "auth_code_purpose")]
pub enum AuthCodePurpose {
    VerifyEmail,
    ResetPassword,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub purpose: AuthCodePurpose,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ---
// Payloads
// ---

// Registro sempre entra numa loja (pelo subdomínio) com status Pending
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(length(min = 3, message = "O nome de usuário deve ter no mínimo 3 caracteres."))]
    #[schema(example = "joao.silva")]
    pub username: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "joao@empresa.com")]
    pub email: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,

    #[validate(length(min = 1, message = "O subdomínio da loja é obrigatório."))]
    #[schema(example = "acme")]
    pub tenant_subdomain: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Segunda submissão do login quando o 2FA está habilitado
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginTwoFactorPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    #[validate(length(equal = 6, message = "O código deve ter 6 dígitos."))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "O subdomínio da loja é obrigatório."))]
    pub tenant_subdomain: String,
    #[validate(length(equal = 6, message = "O código deve ter 6 dígitos."))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "O subdomínio da loja é obrigatório."))]
    pub tenant_subdomain: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "O subdomínio da loja é obrigatório."))]
    pub tenant_subdomain: String,
    #[validate(length(equal = 6, message = "O código deve ter 6 dígitos."))]
    pub code: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnableTwoFactorPayload {
    #[validate(length(equal = 6, message = "O código deve ter 6 dígitos."))]
    pub code: String,
}

// ---
// Respostas
// ---

// Resposta de autenticação: o token e o perfil da sessão aberta
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Login respondeu "falta o segundo fator": nenhum token foi emitido.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorRequiredResponse {
    pub two_factor_required: bool,
}

/// Resultado do setup de 2FA: o segredo e a URL otpauth para o app autenticador
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorSetupResponse {
    pub secret: String,
    pub otpauth_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(tenant_id: Option<Uuid>, imp: Option<Uuid>) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            exp: 0,
            iat: 0,
            tenant_id,
            imp,
        }
    }

    #[test]
    fn sessao_de_loja() {
        let t = Uuid::new_v4();
        assert_eq!(claims(Some(t), None).session_kind(), SessionKind::Tenant(t));
    }

    #[test]
    fn sessao_super_admin_ignora_imp() {
        // tenant_id ausente sempre resolve como Super Admin
        assert_eq!(claims(None, None).session_kind(), SessionKind::SuperAdmin);
        assert_eq!(
            claims(None, Some(Uuid::new_v4())).session_kind(),
            SessionKind::SuperAdmin
        );
    }

    #[test]
    fn sessao_personificada_carrega_o_admin_original() {
        let t = Uuid::new_v4();
        let admin = Uuid::new_v4();
        assert_eq!(
            claims(Some(t), Some(admin)).session_kind(),
            SessionKind::Impersonated {
                tenant_id: t,
                original_admin: admin
            }
        );
    }
}
