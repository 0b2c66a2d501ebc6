use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use kernel::notification::{Email, MailSender};
use reqwest::Client;
use shared::{
    config::MailerConfig,
    error::{AppError, AppResult},
};

/// Mail API client. The endpoint accepts a base64url-encoded RFC 2822
/// message under a bearer token, so this stays a thin HTTP call.
pub struct HttpMailSender {
    client: Client,
    config: MailerConfig,
}

impl HttpMailSender {
    pub fn new(config: MailerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    async fn send(&self, email: Email) -> AppResult<()> {
        let message = format!(
            "From: {}\r\nTo: {} <{}>\r\nSubject: {}\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\n{}",
            self.config.sender, email.to_name, email.to_email, email.subject, email.body
        );
        let raw = general_purpose::URL_SAFE_NO_PAD.encode(message.as_bytes());

        let res = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| AppError::ExternalServiceError(e.into()))?;

        if !res.status().is_success() {
            return Err(AppError::ExternalServiceError(anyhow::anyhow!(
                "mail endpoint returned {}",
                res.status()
            )));
        }

        Ok(())
    }
}
