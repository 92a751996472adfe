use crate::errors::{AppError, messages};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// The authenticated user of a request.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub photo: Option<String>,
    pub password_changed_at: Option<DateTime<Utc>>,
}

impl Principal {
    /// True when the password changed after a token issued at `issued_at`
    /// (unix seconds) was signed.
    pub fn changed_password_after(&self, issued_at: i64) -> bool {
        self.password_changed_at
            .is_some_and(|changed| issued_at < changed.timestamp())
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| *role == self.role)
    }
}

/// Loads the principal a token's subject refers to.
///
/// Implementations return `None` for unknown or deactivated accounts.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    async fn resolve(&self, subject: &str) -> Result<Option<Principal>, AppError>;
}

/// Extractor for the principal stored by the auth guard.
///
/// Only valid on protected routes; elsewhere it rejects as not logged in.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthenticated(messages::NOT_LOGGED_IN.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn principal(changed: Option<DateTime<Utc>>) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            name: "Leo Gillespie".into(),
            email: "leo@example.com".into(),
            role: "guide".into(),
            photo: None,
            password_changed_at: changed,
        }
    }

    #[test]
    fn test_never_changed_password() {
        assert!(!principal(None).changed_password_after(0));
    }

    #[test]
    fn test_token_issued_before_change_is_stale() {
        let changed = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let p = principal(Some(changed));

        assert!(p.changed_password_after(changed.timestamp() - 1));
        assert!(!p.changed_password_after(changed.timestamp()));
        assert!(!p.changed_password_after(changed.timestamp() + 60));
    }

    #[test]
    fn test_role_membership() {
        let p = principal(None);
        assert!(p.has_any_role(&["admin", "lead-guide", "guide"]));
        assert!(!p.has_any_role(&["admin"]));
    }
}
