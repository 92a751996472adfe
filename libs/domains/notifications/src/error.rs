//! Error types for the notifications domain.

use axum_helpers::AppError;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// The mail server refused or never received the message.
    #[error("Email provider error: {0}")]
    ProviderError(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Delivery failures are operational: the caller decides what to tell the user.
impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::ProviderError(message) => AppError::ServiceFailure(message),
            NotificationError::InvalidEmail(address) => {
                AppError::InvalidInput(format!("Invalid email address: {address}"))
            }
            NotificationError::ConfigError(message) => AppError::Internal(message),
        }
    }
}

impl From<lettre::address::AddressError> for NotificationError {
    fn from(err: lettre::address::AddressError) -> Self {
        NotificationError::InvalidEmail(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_is_operational() {
        let app: AppError = NotificationError::ProviderError("connection refused".into()).into();
        assert!(matches!(app, AppError::ServiceFailure(_)));
    }

    #[test]
    fn test_invalid_address_is_client_error() {
        let app: AppError = NotificationError::InvalidEmail("nope".into()).into();
        assert!(matches!(app, AppError::InvalidInput(_)));
    }
}
