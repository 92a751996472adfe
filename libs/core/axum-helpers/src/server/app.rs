use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::{expose_error_details, not_found};
use crate::http::{
    ClientRateLimiter, HttpConfig, SanitizeLimit, create_cors_layer, rate_limit,
    sanitize_json_body, security_headers,
};
use axum::{Router, extract::DefaultBodyLimit, middleware};
use core_config::{Environment, server::ServerConfig};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Wraps the API routes with documentation and the global middleware stack.
///
/// `apis` is nested under `/api` and rate limited per client address. Unknown
/// paths fall through to [`not_found`]. From the outside in, every request passes
/// compression, CORS, security headers, request tracing, the error-detail
/// rewriter, the JSON body sanitizer and the body size limit.
///
/// Health routes are merged by the caller so they stay outside the limiter.
///
/// # Errors
/// Fails when `allowed_origins` contains an unparsable origin or the rate
/// limit quota is zero.
pub fn create_router<T>(apis: Router, config: &HttpConfig, environment: Environment) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};
    use utoipa_swagger_ui::SwaggerUi;

    let cors_layer = create_cors_layer(config.allowed_origins.as_deref())?;
    match &config.allowed_origins {
        Some(origins) => info!(%origins, "CORS restricted to configured origins"),
        None => info!("CORS open to any origin"),
    }

    let limiter = ClientRateLimiter::new(config.rate_limit)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    info!(
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window.as_secs(),
        trust_proxy = config.rate_limit.trust_proxy,
        "rate limiting /api"
    );
    if tokio::runtime::Handle::try_current().is_ok() {
        limiter.spawn_pruning(config.rate_limit.window);
    }

    let body_limit = config.server.body_limit;

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .nest(
            "/api",
            apis.layer(middleware::from_fn_with_state(limiter, rate_limit)),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            SanitizeLimit(body_limit),
            sanitize_json_body,
        ))
        .layer(middleware::from_fn_with_state(environment, expose_error_details))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer)
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Serves `router` until SIGINT/SIGTERM, then runs `cleanup` within
/// `shutdown_timeout`.
///
/// Peer addresses are recorded as `ConnectInfo<SocketAddr>` for the rate limiter.
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (coordinator, mut shutdown_rx) = ShutdownCoordinator::new();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        let _ = shutdown_rx.recv().await;

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(()) => info!("Cleanup completed successfully"),
            Err(_) => tracing::warn!(
                "Cleanup exceeded timeout of {:?}, forcing shutdown",
                shutdown_timeout
            ),
        }
    });

    let signal = coordinator.clone();
    let serve_result = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { signal.wait_for_signal().await })
    .await
    .inspect_err(|e| tracing::error!("Server encountered an error: {:?}", e));

    // A serve error skips the signal path, so release the cleanup task here.
    coordinator.shutdown();
    cleanup_handle.await.ok();

    serve_result
}
