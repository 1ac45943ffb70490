use async_trait::async_trait;

use super::{ensure_recipient, EmailError, EmailSender};

/// Writes messages to the log instead of delivering them
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        ensure_recipient(to)?;
        tracing::info!(
            "Email (not delivered) to={} subject=\"{}\" bytes={}",
            to,
            subject,
            body.len()
        );
        tracing::debug!("Email body:\n{}", body);
        Ok(())
    }
}
