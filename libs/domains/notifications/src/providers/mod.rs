//! Email provider implementations.
//!
//! This module contains the `EmailProvider` trait and the SMTP transport
//! used in every environment (Mailtrap or Mailpit in development).

mod smtp;

pub use smtp::{EmailConfig, SmtpProvider};

use crate::error::NotificationResult;
use crate::models::{EmailContent, SentEmail};
use async_trait::async_trait;

/// Trait for email sending providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;

    async fn health_check(&self) -> NotificationResult<bool>;
}
