// src/services/email.rs

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};

/// Envio de e-mails transacionais (códigos de verificação e de reset).
/// Sem SMTP configurado o serviço vira um no-op que só loga — útil em
/// desenvolvimento, onde o código aparece no log.
#[derive(Clone)]
pub struct EmailService {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailService {
    pub fn from_env() -> Self {
        let from = std::env::var("EMAIL_FROM")
            .unwrap_or_else(|_| "ERP <no-reply@localhost>".to_string());

        let mailer = match (
            std::env::var("EMAIL_HOST"),
            std::env::var("EMAIL_USER"),
            std::env::var("EMAIL_PASS"),
        ) {
            (Ok(host), Ok(user), Ok(pass)) => {
                match AsyncSmtpTransport::<Tokio1Executor>::relay(&host) {
                    Ok(builder) => Some(builder.credentials(Credentials::new(user, pass)).build()),
                    Err(e) => {
                        tracing::warn!("SMTP mal configurado ({e}); e-mails serão apenas logados");
                        None
                    }
                }
            }
            _ => {
                tracing::info!("SMTP não configurado; e-mails serão apenas logados");
                None
            }
        };

        Self { mailer, from }
    }

    /// Envia o código de 6 dígitos. Falha de envio não derruba o fluxo de
    /// quem chamou: o usuário pode pedir outro código.
    pub async fn send_code(&self, to: &str, subject: &str, code: &str) {
        let Some(mailer) = &self.mailer else {
            tracing::info!("[email desabilitado] para={to} assunto={subject} codigo={code}");
            return;
        };

        let body = format!(
            "Seu código de verificação é: {code}\n\nEle expira em 15 minutos. \
             Se você não solicitou este código, ignore este e-mail."
        );

        let message = self
            .from
            .parse()
            .map_err(|e| format!("remetente inválido: {e}"))
            .and_then(|from| {
                to.parse()
                    .map_err(|e| format!("destinatário inválido: {e}"))
                    .and_then(|to| {
                        Message::builder()
                            .from(from)
                            .to(to)
                            .subject(subject)
                            .header(ContentType::TEXT_PLAIN)
                            .body(body)
                            .map_err(|e| format!("falha ao montar e-mail: {e}"))
                    })
            });

        match message {
            Ok(message) => {
                if let Err(e) = mailer.send(message).await {
                    tracing::error!("Falha ao enviar e-mail para {to}: {e}");
                }
            }
            Err(e) => tracing::error!("{e}"),
        }
    }
}
