//! Account emails sent by the API.

use crate::error::NotificationResult;
use crate::models::EmailContent;
use crate::providers::EmailProvider;
use std::sync::Arc;
use tracing::{info, instrument};

/// Minutes a password reset link stays valid.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

#[derive(Clone)]
pub struct NotificationService {
    provider: Arc<dyn EmailProvider>,
}

impl NotificationService {
    pub fn new(provider: Arc<dyn EmailProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn EmailProvider> {
        &self.provider
    }

    /// Mail the reset link to the account owner.
    #[instrument(skip(self, reset_url), fields(provider = self.provider.name()))]
    pub async fn send_password_reset(
        &self,
        to_email: &str,
        to_name: &str,
        reset_url: &str,
    ) -> NotificationResult<()> {
        let email = EmailContent::new(
            to_email,
            to_name,
            format!("Your password reset token (valid for {RESET_TOKEN_TTL_MINUTES} min)"),
            format!(
                "Forgot your password? Submit a PATCH request with your new password and \
                 passwordConfirm to: {reset_url}.\nIf you didn't forget your password, please ignore this email!"
            ),
        );

        self.provider.send(&email).await?;
        info!("password reset email sent");
        Ok(())
    }

    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn send_welcome(&self, to_email: &str, to_name: &str) -> NotificationResult<()> {
        let first_name = to_name.split_whitespace().next().unwrap_or(to_name);
        let email = EmailContent::new(
            to_email,
            to_name,
            "Welcome to the Natours Family!",
            format!("Hi {first_name},\nWelcome to Natours, we're glad to have you!"),
        );

        self.provider.send(&email).await?;
        info!("welcome email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;
    use crate::models::SentEmail;
    use crate::providers::MockEmailProvider;

    fn provider_expecting(check: impl Fn(&EmailContent) -> bool + Send + 'static) -> MockEmailProvider {
        let mut provider = MockEmailProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_send()
            .withf(move |email| check(email))
            .times(1)
            .returning(|_| {
                Ok(SentEmail {
                    message_id: None,
                    accepted: true,
                })
            });
        provider
    }

    #[tokio::test]
    async fn test_password_reset_contains_url() {
        let provider = provider_expecting(|email| {
            email.to_email == "leo@example.com"
                && email.subject.contains("valid for 10 min")
                && email
                    .text_body
                    .contains("http://127.0.0.1:8000/api/v1/users/resetPassword/abc123")
        });
        let service = NotificationService::new(Arc::new(provider));

        service
            .send_password_reset(
                "leo@example.com",
                "Leo Gillespie",
                "http://127.0.0.1:8000/api/v1/users/resetPassword/abc123",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_welcome_greets_first_name() {
        let provider = provider_expecting(|email| email.text_body.starts_with("Hi Leo,"));
        let service = NotificationService::new(Arc::new(provider));

        service.send_welcome("leo@example.com", "Leo Gillespie").await.unwrap();
    }

    #[tokio::test]
    async fn test_provider_failure_is_returned() {
        let mut provider = MockEmailProvider::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_send()
            .returning(|_| Err(NotificationError::ProviderError("connection refused".into())));
        let service = NotificationService::new(Arc::new(provider));

        let err = service
            .send_password_reset("leo@example.com", "Leo", "http://localhost/reset")
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::ProviderError(_)));
    }
}
