//! Outbound delivery of approved replies

mod smtp;

use async_trait::async_trait;

use crate::error::TriageError;

pub use smtp::SmtpClient;

/// Something that can deliver a plain-text reply to one recipient
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<(), TriageError>;
}
