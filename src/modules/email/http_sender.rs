use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{ensure_recipient, EmailError, EmailSender};
use crate::core::config::EmailConfig;

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Sends plain-text mail through a JSON transactional-mail API
pub struct HttpEmailSender {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from_address: String,
}

impl HttpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let api_url = config
            .api_url
            .clone()
            .ok_or_else(|| EmailError::Transport("EMAIL_API_URL is not set".to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("ServiceCenterCore/1.0")
            .build()
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        ensure_recipient(to)?;

        let message = OutgoingMessage {
            from: &self.from_address,
            to: to.trim(),
            subject,
            text: body,
        };

        let mut request = self.client.post(&self.api_url).json(&message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Mail API request failed: {}", e);
            EmailError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body: detail,
            });
        }

        tracing::info!("Email sent to {} ({})", to, subject);
        Ok(())
    }
}
