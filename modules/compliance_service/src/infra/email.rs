//! Email delivery through the tracing log

use crate::domain::otp::EmailSender;

/// Writes outgoing mail to the log instead of an SMTP relay
pub struct TracingEmailSender {
    from: String,
}

impl TracingEmailSender {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait::async_trait]
impl EmailSender for TracingEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(from = %self.from, to, subject, "email sent");
        tracing::debug!(to, body, "email body");
        Ok(())
    }
}
