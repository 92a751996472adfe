//! HTTP middleware: CORS, security headers, body sanitizing and per-client
//! rate limiting.
//!
//! ```ignore
//! use axum_helpers::http::{create_cors_layer, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(origins.as_deref())?);
//! ```

pub mod cors;
pub mod rate_limit;
pub mod sanitize;
pub mod security;

use core_config::{ConfigError, FromEnv, server::ServerConfig};

pub use cors::create_cors_layer;
pub use rate_limit::{ClientRateLimiter, RateLimitConfig, rate_limit};
pub use sanitize::{SanitizeLimit, sanitize_json_body, strip_operator_keys};
pub use security::security_headers;

/// Everything the HTTP layer reads from the environment.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    /// Comma-separated origins from `CORS_ALLOWED_ORIGIN`
    pub allowed_origins: Option<String>,
}

impl FromEnv for HttpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            allowed_origins: std::env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            allowed_origins: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_origin_is_treated_as_unset() {
        temp_env::with_var("CORS_ALLOWED_ORIGIN", Some("  "), || {
            let config = HttpConfig::from_env().unwrap();
            assert!(config.allowed_origins.is_none());
        });
    }
}
