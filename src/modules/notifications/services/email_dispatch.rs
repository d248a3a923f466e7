use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::MailConfig;
use crate::core::{AppError, Result};

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Delivers one email. A single attempt; callers decide what a failure means.
#[async_trait]
pub trait EmailDispatch: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// SMTP delivery over STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        info!(
            "Initializing SMTP transport for {}:{}",
            config.smtp_host, config.smtp_port
        );

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Configuration(format!("Invalid SMTP relay: {}", e)))?
            .port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| AppError::Configuration(format!("Invalid MAIL_FROM: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailDispatch for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::mail(format!("Invalid recipient {}: {}", message.to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| AppError::mail(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::mail(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
