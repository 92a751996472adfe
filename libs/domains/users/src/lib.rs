//! Users Domain
//!
//! Accounts and authentication for the API.
//!
//! # Features
//!
//! - Signup, login and logout with a JWT in the body and an HttpOnly cookie
//! - Password hashing with Argon2
//! - Password reset through an emailed, hashed, 10 minute token
//! - Self-service `me` endpoints and soft deletion
//! - Admin CRUD through the generic resource handlers
//! - [`PrincipalResolver`](axum_helpers::PrincipalResolver) for the auth guard
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, cookies
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Auth flows, reset tokens, emails
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← User lookups, principal resolution
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← User entity, request DTOs, roles
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_users::{Sessions, UserRepository, UserService, handlers};
//!
//! let repository = Repository::<User>::new(store);
//! let guard = AuthGuard::new(jwt.clone(), Arc::new(UserRepository::new(repository.clone())));
//! let service = UserService::new(repository, Sessions::new(&jwt_config, environment), notifications);
//!
//! let router = handlers::router(service, &guard);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod session;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use models::{CreateUser, Role, SignupRequest, UpdateUser, User};
pub use repository::UserRepository;
pub use service::UserService;
pub use session::Sessions;
