//! Notification delivery sinks.
//!
//! [`EmailSink`] sends plain-text mail over SMTP; [`LogSink`] writes the
//! notification to the log and is the fallback whenever SMTP is not fully
//! configured. Both sit behind [`NotificationSink`] so the consumer loop
//! and its tests never depend on a live mail server.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;
use crate::render::Notification;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("message build error: {0}")]
    Build(String),
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError>;
}

/// SMTP delivery via STARTTLS.
pub struct EmailSink {
    from_address: String,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailSink {
    pub fn new(cfg: &SmtpConfig) -> Result<Self, SinkError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.user.clone(), cfg.password.clone()))
            .build();

        Ok(Self {
            from_address: cfg.from_address.clone(),
            transport,
        })
    }
}

#[async_trait]
impl NotificationSink for EmailSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(notification.recipient.parse()?)
            .subject(&notification.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| SinkError::Build(e.to_string()))?;

        self.transport.send(email).await?;

        tracing::info!(
            to = %notification.recipient,
            subject = %notification.subject,
            "notification email sent"
        );
        Ok(())
    }
}

/// Log-only delivery, used when SMTP is not configured.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), SinkError> {
        tracing::info!(
            to = %notification.recipient,
            subject = %notification.subject,
            body = %notification.body,
            "notification (log fallback)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        let n = Notification {
            subject: "[Battery Passport] passport.created".into(),
            body: "Record: R1".into(),
            recipient: "ops@example.com".into(),
        };
        assert!(LogSink.deliver(&n).await.is_ok());
    }

    #[test]
    fn sink_error_display() {
        let err = SinkError::Build("missing body".into());
        assert_eq!(err.to_string(), "message build error: missing body");
    }
}
