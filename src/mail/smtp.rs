use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::{SenderCredentials, SmtpConfig};
use crate::error::TriageError;

use super::MailTransport;

pub struct SmtpClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpClient {
    pub fn new(config: &SmtpConfig, sender: &SenderCredentials) -> Result<Self> {
        let creds = Credentials::new(sender.email.clone(), sender.app_credential.clone());

        // Always STARTTLS; app credentials must never travel in plaintext
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .context("Failed to create SMTP transport")?
            .port(config.port)
            .credentials(creds)
            .authentication(vec![Mechanism::Plain, Mechanism::Login])
            .build();

        Ok(Self {
            transport,
            from: sender_mailbox(sender)?,
        })
    }
}

fn sender_mailbox(sender: &SenderCredentials) -> Result<Mailbox> {
    let address = match sender.name {
        Some(ref name) => format!("{} <{}>", name, sender.email),
        None => sender.email.clone(),
    };
    address.parse::<Mailbox>().context("Invalid sender address")
}

/// Build a plain-text reply message
pub fn build_message(from: &Mailbox, subject: &str, body: &str, recipient: &str) -> Result<Message> {
    let to = recipient
        .trim()
        .parse::<Mailbox>()
        .with_context(|| format!("Invalid recipient address: {}", recipient))?;

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .context("Failed to build email message")
}

#[async_trait]
impl MailTransport for SmtpClient {
    async fn send(&self, subject: &str, body: &str, recipient: &str) -> Result<(), TriageError> {
        let message = build_message(&self.from, subject, body, recipient)
            .map_err(|e| TriageError::Transport(format!("{:#}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| TriageError::Transport(format!("Failed to send email: {}", e)))?;

        tracing::info!("Reply sent to {}", recipient);
        Ok(())
    }
}
