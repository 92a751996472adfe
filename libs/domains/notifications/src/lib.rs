//! Notifications Domain
//!
//! Account emails (password reset, welcome) sent through an
//! [`EmailProvider`]. Production and development both use SMTP; tests swap
//! in a mock provider.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Auth handlers  │  ← forgot password, signup
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ NotificationSvc │  ← builds the message text
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Email Provider  │  ← SMTP via lettre
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use core_config::FromEnv;
//! use domain_notifications::{EmailConfig, NotificationService, SmtpProvider};
//!
//! let provider = SmtpProvider::new(&EmailConfig::from_env()?)?;
//! let notifications = NotificationService::new(Arc::new(provider));
//!
//! notifications.send_password_reset(&email, &name, &reset_url).await?;
//! ```

pub mod error;
pub mod models;
pub mod providers;
pub mod service;

pub use error::{NotificationError, NotificationResult};
pub use models::{EmailContent, SentEmail};
pub use providers::{EmailConfig, EmailProvider, SmtpProvider};
pub use service::{NotificationService, RESET_TOKEN_TTL_MINUTES};
