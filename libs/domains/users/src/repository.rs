use async_trait::async_trait;
use axum_helpers::{AppError, Principal, PrincipalResolver};
use mongodb::bson::doc;
use resource_handler::{Repository, StoreResult};
use tracing::instrument;
use uuid::Uuid;

use crate::models::User;

/// User lookups on top of the generic repository.
///
/// Every query goes through [`Repository`], so deactivated accounts are
/// never found.
#[derive(Clone)]
pub struct UserRepository {
    inner: Repository<User>,
}

impl UserRepository {
    pub fn new(inner: Repository<User>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Repository<User> {
        &self.inner
    }

    pub async fn get_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_by_id(id).await
    }

    /// Emails are stored lower-cased, so the lookup is case insensitive.
    pub async fn get_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner
            .find_one(doc! { "email": email.trim().to_lowercase() })
            .await
    }

    pub async fn get_by_reset_token(&self, hashed: &str) -> StoreResult<Option<User>> {
        self.inner
            .find_one(doc! { "passwordResetToken": hashed })
            .await
    }

    /// Write back every field, including cleared optional ones.
    pub async fn save(&self, user: &User) -> StoreResult<bool> {
        self.inner.replace(user).await
    }

    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.update_fields(id, doc! { "active": false }).await
    }
}

#[async_trait]
impl PrincipalResolver for UserRepository {
    async fn resolve(&self, subject: &str) -> Result<Option<Principal>, AppError> {
        let Ok(id) = Uuid::parse_str(subject) else {
            return Ok(None);
        };

        let user = self.get_by_id(id).await.map_err(AppError::from)?;
        Ok(user.map(|user| Principal {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role.to_string(),
            photo: Some(user.photo),
            password_changed_at: user.password_changed_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateUser;
    use resource_handler::{InMemoryStore, Resource};
    use std::sync::Arc;

    async fn repository() -> UserRepository {
        let inner = Repository::<User>::new(Arc::new(InMemoryStore::new()));
        inner.ensure_indexes().await.unwrap();
        UserRepository::new(inner)
    }

    fn user(email: &str, role: &str) -> User {
        User::from_create(CreateUser {
            name: Some("Jennifer Hardy".into()),
            email: Some(email.into()),
            photo: Some("user-6.jpg".into()),
            role: Some(role.into()),
            password: Some("pass1234".into()),
            password_confirm: Some("pass1234".into()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_by_email_ignores_case() {
        let repo = repository().await;
        let created = user("jennifer@example.com", "user");
        repo.inner().insert(&created).await.unwrap();

        let found = repo.get_by_email("Jennifer@Example.com ").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn test_deactivated_user_is_invisible() {
        let repo = repository().await;
        let created = user("jennifer@example.com", "user");
        repo.inner().insert(&created).await.unwrap();

        assert!(repo.deactivate(created.id).await.unwrap());

        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(repo.get_by_email("jennifer@example.com").await.unwrap().is_none());
        assert!(repo.resolve(&created.id.to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_builds_principal() {
        let repo = repository().await;
        let created = user("lead@example.com", "lead-guide");
        repo.inner().insert(&created).await.unwrap();

        let principal = repo.resolve(&created.id.to_string()).await.unwrap().unwrap();
        assert_eq!(principal.role, "lead-guide");
        assert_eq!(principal.photo.as_deref(), Some("user-6.jpg"));
        assert!(principal.password_changed_at.is_none());
    }

    #[tokio::test]
    async fn test_resolve_garbage_subject() {
        let repo = repository().await;
        assert!(repo.resolve("5c8a1d5b0190b214360dc057").await.unwrap().is_none());
    }
}
