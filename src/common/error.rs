use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro único, com `thiserror` para melhor ergonomia.
// Tudo que um handler pode devolver de ruim passa por aqui.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Código de verificação inválido ou expirado")]
    InvalidAuthCode,

    #[error("Código do segundo fator inválido")]
    InvalidTotpCode,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Recurso não encontrado: {0}")]
    NotFound(String),

    #[error("Você precisa da permissão '{0}' para realizar esta ação.")]
    PermissionDenied(String),

    #[error("Acesso restrito ao Super Admin.")]
    SuperAdminOnly,

    #[error("Usuário não pertence a esta loja.")]
    NotATenantMember,

    #[error("Esta loja está inativa.")]
    TenantInactive,

    #[error("Já existe um registro com esse valor: {0}")]
    UniqueConstraintViolation(String),

    #[error("O subdomínio '{0}' já está em uso.")]
    SubdomainAlreadyExists(String),

    #[error("SKU já cadastrado nesta loja.")]
    SkuAlreadyExists,

    #[error("Estoque insuficiente para o produto '{0}'.")]
    InsufficientStock(String),

    #[error("Transição de status inválida: {0} -> {1}")]
    InvalidStatusTransition(String, String),

    #[error("Holerite já gerado para este funcionário neste mês.")]
    PayslipAlreadyExists,

    #[error("CSV malformado na linha {0}: {1}")]
    CsvRow(usize, String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::InvalidAuthCode
            | AppError::InvalidTotpCode => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_)
            | AppError::SuperAdminOnly
            | AppError::NotATenantMember
            | AppError::TenantInactive => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::UniqueConstraintViolation(_)
            | AppError::SubdomainAlreadyExists(_)
            | AppError::SkuAlreadyExists
            | AppError::InsufficientStock(_)
            | AppError::InvalidStatusTransition(_, _)
            | AppError::PayslipAlreadyExists => StatusCode::CONFLICT,
            AppError::CsvRow(_, _) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Retorna todos os detalhes da validação, campo por campo.
        if let AppError::ValidationError(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "Um ou mais campos são inválidos.",
                "details": details,
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let status = self.status();

        // Erros 500 não vazam detalhes pro cliente; o `tracing` loga a
        // mensagem completa que o `thiserror` nos deu.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
            "Ocorreu um erro inesperado.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
