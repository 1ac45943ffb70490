//! Outgoing mail
//!
//! Bills are mailed through a transactional-mail HTTP API when one is
//! configured. Without one, messages are only written to the log.

mod http_sender;
mod log_sender;

pub use http_sender::HttpEmailSender;
pub use log_sender::LogEmailSender;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::core::config::EmailConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Mail API rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;
}

/// Pick the sender implied by configuration
pub fn sender_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailSender>, EmailError> {
    match config.api_url.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            tracing::info!("Email delivery via HTTP API at {}", url);
            Ok(Arc::new(HttpEmailSender::new(config)?))
        }
        _ => {
            tracing::warn!("EMAIL_API_URL not set, bill emails will only be logged");
            Ok(Arc::new(LogEmailSender))
        }
    }
}

pub(crate) fn ensure_recipient(to: &str) -> Result<(), EmailError> {
    let trimmed = to.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(EmailError::InvalidRecipient(trimmed.to_string())),
    }
}
