//! JWT authentication and role checks.
//!
//! Tokens travel as `Authorization: Bearer` or in the `jwt` cookie. The
//! [`AuthGuard`] verifies them, loads the [`Principal`] through a
//! [`PrincipalResolver`] and rejects tokens older than the last password
//! change.

pub mod config;
pub mod cookies;
pub mod jwt;
pub mod middleware;
pub mod principal;

pub use config::JwtConfig;
pub use cookies::{TOKEN_COOKIE, logout_cookie, token_cookie};
pub use jwt::{JwtAuth, JwtClaims};
pub use middleware::{AllowedRoles, AuthGuard, protect, restrict_to};
pub use principal::{CurrentUser, Principal, PrincipalResolver};
