//! # Axum Helpers
//!
//! Shared building blocks for the Natours HTTP services.
//!
//! - **[`errors`]**: `AppError`, the `{status, message}` envelope and the
//!   development-only error detail middleware
//! - **[`auth`]**: HS256 tokens, auth cookies and the route guard
//! - **[`extractors`]**: id path and JSON body extractors that reject with `AppError`
//! - **[`http`]**: CORS, security headers, body sanitizing and rate limiting
//! - **[`server`]**: router assembly, health endpoints and graceful shutdown
//!
//! ```ignore
//! use axum_helpers::http::HttpConfig;
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::{Environment, FromEnv, app_info};
//!
//! let http = HttpConfig::from_env()?;
//! let router = create_router::<ApiDoc>(api_routes, &http, Environment::from_env())?
//!     .merge(health_router(app_info!()));
//! create_production_app(router, &http.server, Duration::from_secs(30), async {}).await?;
//! ```

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{
    AllowedRoles, AuthGuard, CurrentUser, JwtAuth, JwtClaims, JwtConfig, Principal,
    PrincipalResolver,
};

pub use server::{
    HealthCheckFuture, HealthResponse, ReadyResponse, ShutdownCoordinator, create_production_app,
    create_router, health_router, run_health_checks, shutdown_signal,
};

pub use http::{HttpConfig, RateLimitConfig, create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{JsonBody, UuidPath, ValidatedJson};
