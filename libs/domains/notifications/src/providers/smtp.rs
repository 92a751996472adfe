//! SMTP email provider implementation using lettre.

use super::EmailProvider;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{EmailContent, SentEmail};
use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_flag, env_or_default, env_parse_or};
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, error, info};

/// SMTP configuration.
///
/// Loaded from environment variables:
/// - `EMAIL_HOST` (default: localhost)
/// - `EMAIL_PORT` (default: 1025)
/// - `EMAIL_USERNAME` / `EMAIL_PASSWORD` (optional, used together)
/// - `EMAIL_FROM` (default: `Natours <hello@natours.io>`)
/// - `EMAIL_USE_TLS` (default: false)
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    /// `Name <address>` or a bare address
    pub from: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// False for local capture servers like Mailpit or Mailtrap
    pub use_tls: bool,
}

impl EmailConfig {
    pub fn new(host: impl Into<String>, port: u16, from: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            from: from.into(),
            username: None,
            password: None,
            use_tls: false,
        }
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                Some(Credentials::new(username.clone(), password.clone()))
            }
            _ => None,
        }
    }
}

impl FromEnv for EmailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Ok(Self {
            host: env_or_default("EMAIL_HOST", "localhost"),
            port: env_parse_or("EMAIL_PORT", 1025)?,
            from: env_or_default("EMAIL_FROM", "Natours <hello@natours.io>"),
            username: non_empty("EMAIL_USERNAME"),
            password: non_empty("EMAIL_PASSWORD"),
            use_tls: env_flag("EMAIL_USE_TLS", false),
        })
    }
}

pub struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl SmtpProvider {
    pub fn new(config: &EmailConfig) -> NotificationResult<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| NotificationError::ConfigError(format!("Invalid EMAIL_FROM: {e}")))?;

        Ok(Self {
            transport: Self::build_transport(config)?,
            from,
            host: config.host.clone(),
        })
    }

    fn build_transport(config: &EmailConfig) -> NotificationResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host).map_err(|e| {
                NotificationError::ConfigError(format!("Failed to create SMTP relay: {e}"))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        }
        .port(config.port);

        if let Some(credentials) = config.credentials() {
            builder = builder.credentials(credentials);
        }

        Ok(builder.build())
    }

    fn build_message(&self, email: &EmailContent) -> NotificationResult<Message> {
        let address: Address = email.to_email.parse()?;
        let to = Mailbox::new(Some(email.to_name.clone()).filter(|n| !n.is_empty()), address);

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.text_body.clone())
            .map_err(|e| NotificationError::ProviderError(format!("Failed to build email message: {e}")))
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        debug!(to = %email.to_email, subject = %email.subject, host = %self.host, "Sending email via SMTP");

        let message = self.build_message(email)?;

        let response = self.transport.send(message).await.map_err(|e| {
            error!(to = %email.to_email, error = %e, "Failed to send email via SMTP");
            NotificationError::ProviderError(format!("SMTP send failed: {e}"))
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
            .map_err(|e| NotificationError::ProviderError(format!("SMTP health check failed: {e}")))
    }
}
