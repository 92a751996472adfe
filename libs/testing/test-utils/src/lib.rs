//! Shared test utilities for domain testing
//!
//! This crate provides reusable test infrastructure for all domain crates:
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongo")
//! - `TestAuth`: auth guard with an in-memory principal table and token issuing
//! - `TestRequest`: in-process requests against a router
//! - `TestDataBuilder`: deterministic test data generation
//! - `assertions`: custom assertion helpers for the API envelopes
//!
//! # Usage
//!
//! ## Router tests
//!
//! ```rust,ignore
//! use test_utils::{TestAuth, TestRequest};
//!
//! #[tokio::test]
//! async fn test_admin_can_create() {
//!     let auth = TestAuth::new();
//!     let router = domain_tours::handlers::router(service, &auth.guard());
//!     let (_, token) = auth.login("admin");
//!
//!     let response = TestRequest::post("/").bearer(&token).json(body).send(&router).await;
//!     assert_eq!(response.status, StatusCode::CREATED);
//! }
//! ```
//!
//! ## MongoDB Testing
//!
//! These tests need Docker and are marked `#[ignore]`:
//!
//! ```rust,no_run
//! use test_utils::TestMongo;
//!
//! # async fn example() {
//! let mongo = TestMongo::new().await;
//! let db = mongo.database();
//! # }
//! ```

mod auth;
mod http;

#[cfg(feature = "mongo")]
mod mongo;

pub use auth::{TEST_JWT_SECRET, TestAuth};
pub use http::{TestRequest, TestResponse};

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_resource");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a unique name for testing
    ///
    /// # Arguments
    ///
    /// * `prefix` - The type of resource (e.g., "tour", "user")
    /// * `suffix` - A unique identifier within the test (e.g., "main", "backup")
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("my_test");
    /// let name = builder.name("tour", "main");
    /// // Returns: "test-tour-12345-main"
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// A unique, valid email address
    pub fn email(&self, local: &str) -> String {
        format!("{}-{}@example.com", local, self.seed)
    }
}

/// Test assertion helpers
pub mod assertions {
    use crate::http::TestResponse;
    use axum::http::StatusCode;

    /// Assert a success envelope with `status`.
    pub fn assert_success(response: &TestResponse, status: StatusCode) {
        assert_eq!(response.status, status, "{}", response.body);
        assert_eq!(response.body["status"], "success", "{}", response.body);
    }

    /// Assert an error envelope with `status` whose message contains `message`.
    pub fn assert_error(response: &TestResponse, status: StatusCode, message: &str) {
        assert_eq!(response.status, status, "{}", response.body);
        let label = if status.is_server_error() { "error" } else { "fail" };
        assert_eq!(response.body["status"], label, "{}", response.body);
        assert!(
            response.message().contains(message),
            "expected message containing {message:?}, got {:?}",
            response.message()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(
            builder1.name("tour", "test"),
            builder2.name("tour", "test")
        );
    }

    #[test]
    fn test_data_builder_from_name() {
        let builder1 = TestDataBuilder::from_test_name("my_test");
        let builder2 = TestDataBuilder::from_test_name("my_test");

        assert_eq!(builder1.email("leo"), builder2.email("leo"));
    }

    #[test]
    fn test_data_builder_email_is_unique_per_seed() {
        assert_ne!(
            TestDataBuilder::new(1).email("leo"),
            TestDataBuilder::new(2).email("leo")
        );
    }

    #[tokio::test]
    async fn test_auth_tokens_resolve() {
        let auth = TestAuth::new();
        let (principal, token) = auth.login("guide");

        let claims = auth.jwt().verify(&token).unwrap();
        assert_eq!(claims.sub, principal.id.to_string());
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        // Different test names should generate different data
        assert_ne!(builder1.name("tour", "a"), builder2.name("tour", "a"));
    }
}
