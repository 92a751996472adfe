//! Authentication fixtures
//!
//! `TestAuth` wires an [`AuthGuard`] to an in-memory principal table so
//! router tests can issue real tokens for any role.

use async_trait::async_trait;
use axum_helpers::{AppError, AuthGuard, JwtAuth, JwtConfig, Principal, PrincipalResolver};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Signing secret used by every test guard.
pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-chars";

#[derive(Default)]
struct StaticPrincipals(RwLock<HashMap<String, Principal>>);

#[async_trait]
impl PrincipalResolver for StaticPrincipals {
    async fn resolve(&self, subject: &str) -> Result<Option<Principal>, AppError> {
        let principals = self
            .0
            .read()
            .map_err(|_| AppError::Internal("principal table poisoned".into()))?;
        Ok(principals.get(subject).cloned())
    }
}

/// Guard plus token issuing for tests.
///
/// ```
/// use test_utils::TestAuth;
///
/// let auth = TestAuth::new();
/// let (admin, token) = auth.login("admin");
/// assert_eq!(admin.role, "admin");
/// assert!(!token.is_empty());
/// ```
#[derive(Clone)]
pub struct TestAuth {
    jwt: JwtAuth,
    principals: Arc<StaticPrincipals>,
}

impl TestAuth {
    pub fn new() -> Self {
        let config = JwtConfig::new(TEST_JWT_SECRET).expect("test secret is long enough");
        Self {
            jwt: JwtAuth::new(&config),
            principals: Arc::new(StaticPrincipals::default()),
        }
    }

    pub fn jwt(&self) -> &JwtAuth {
        &self.jwt
    }

    pub fn guard(&self) -> AuthGuard {
        AuthGuard::new(self.jwt.clone(), self.principals.clone())
    }

    /// Register `principal` and sign a token for it.
    pub fn register(&self, principal: Principal) -> String {
        let token = self
            .jwt
            .sign(&principal.id.to_string())
            .expect("token signing");
        self.principals
            .0
            .write()
            .expect("principal table")
            .insert(principal.id.to_string(), principal);
        token
    }

    /// A fresh principal with `role`, registered and signed in.
    pub fn login(&self, role: &str) -> (Principal, String) {
        let id = Uuid::now_v7();
        let principal = Principal {
            id,
            name: format!("Test {role}"),
            email: format!("{role}-{id}@example.com"),
            role: role.to_string(),
            photo: Some("default.jpg".into()),
            password_changed_at: None,
        };
        let token = self.register(principal.clone());
        (principal, token)
    }
}

impl Default for TestAuth {
    fn default() -> Self {
        Self::new()
    }
}
