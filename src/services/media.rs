// src/services/media.rs

use async_trait::async_trait;

use crate::common::error::AppError;

/// Armazenamento de mídia (avatares). Trait para trocar o provedor nos
/// testes sem rede.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Sobe os bytes e retorna a URL pública.
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String, AppError>;
}

/// Upload não assinado no Cloudinary (preset configurado no painel deles)
pub struct CloudinaryStorage {
    client: reqwest::Client,
    cloud_name: String,
    upload_preset: String,
}

impl CloudinaryStorage {
    pub fn new(cloud_name: String, upload_preset: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name,
            upload_preset,
        }
    }
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<String, AppError> {
        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Falha no upload para o Cloudinary: {e}"))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Cloudinary respondeu {} no upload",
                response.status()
            )
            .into());
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Resposta inválida do Cloudinary: {e}"))?;

        body["secure_url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Resposta do Cloudinary sem secure_url").into())
    }
}
