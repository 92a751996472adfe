//! Data models for the notifications domain.

/// A plain-text email ready for sending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailContent {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub text_body: String,
}

impl EmailContent {
    pub fn new(
        to_email: impl Into<String>,
        to_name: impl Into<String>,
        subject: impl Into<String>,
        text_body: impl Into<String>,
    ) -> Self {
        Self {
            to_email: to_email.into(),
            to_name: to_name.into(),
            subject: subject.into(),
            text_body: text_body.into(),
        }
    }
}

/// Result of a send reported by the provider.
#[derive(Debug, Clone)]
pub struct SentEmail {
    /// Provider-specific message ID for tracking.
    pub message_id: Option<String>,
    pub accepted: bool,
}
