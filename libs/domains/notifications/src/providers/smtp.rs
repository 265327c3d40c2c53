//! SMTP email provider implementation using lettre.
//!
//! Without TLS the provider talks plain SMTP, which is what local catchers
//! such as MailHog/Mailpit expect.

use super::{EmailContent, EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_flag, env_optional, env_or_default, env_parse};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, error, info};

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Sender email address.
    pub from_email: String,
    /// Sender name.
    pub from_name: String,
    /// SMTP username (optional for dev servers like Mailpit).
    pub username: Option<String>,
    /// SMTP password (optional for dev servers like Mailpit).
    pub password: Option<String>,
    /// Whether to use TLS (false for local dev servers).
    pub use_tls: bool,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>, port: u16, from_email: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            from_email: from_email.into(),
            from_name: "Retail".to_string(),
            username: None,
            password: None,
            use_tls: false,
        }
    }

    pub fn with_from_name(mut self, from_name: impl Into<String>) -> Self {
        self.from_name = from_name.into();
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}

impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let username = env_optional("SMTP_USERNAME");
        let password = env_optional("SMTP_PASSWORD");
        if username.is_some() != password.is_some() {
            return Err(ConfigError::InvalidValue {
                key: "SMTP_USERNAME".to_string(),
                details: "SMTP_USERNAME and SMTP_PASSWORD must be set together".to_string(),
            });
        }

        Ok(Self {
            host: env_or_default("SMTP_HOST", "localhost"),
            port: env_parse("SMTP_PORT", 1025u16)?,
            from_email: env_or_default("SMTP_FROM_EMAIL", "noreply@localhost"),
            from_name: env_or_default("SMTP_FROM_NAME", "Retail"),
            username,
            password,
            use_tls: env_flag("SMTP_TLS", false)?,
        })
    }
}

/// SMTP email provider.
pub struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> NotificationResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self { transport, config })
    }

    fn build_transport(config: &SmtpConfig) -> NotificationResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| NotificationError::Delivery(format!("Failed to create SMTP relay: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(builder.build())
    }

    fn build_message(&self, email: &EmailContent) -> NotificationResult<Message> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| NotificationError::Config(format!("Invalid from address: {}", e)))?;

        let to: Mailbox = email
            .to_email
            .parse()
            .map_err(|_| NotificationError::InvalidRecipient(email.to_email.clone()))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| NotificationError::Delivery(format!("Failed to build email message: {}", e)))
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        debug!(
            to = %email.to_email,
            subject = %email.subject,
            host = %self.config.host,
            port = %self.config.port,
            "Sending email via SMTP"
        );

        let message = self.build_message(email)?;

        let response = self.transport.send(message).await.map_err(|e| {
            error!(to = %email.to_email, error = %e, "Failed to send email via SMTP");
            NotificationError::Delivery(format!("SMTP send failed: {}", e))
        })?;

        let message_id = response.message().next().map(|s| s.to_string());

        info!(to = %email.to_email, message_id = ?message_id, "Email sent via SMTP");

        Ok(SentEmail {
            message_id,
            accepted: response.is_positive(),
        })
    }

    fn name(&self) -> &'static str {
        "SMTP"
    }

    async fn health_check(&self) -> NotificationResult<bool> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| NotificationError::Delivery(format!("SMTP health check failed: {}", e)))
    }
}
