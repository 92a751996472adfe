use axum::{
    Json,
    extract::{OriginalUri, Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::{IntoResponse, Response},
};
use core_config::Environment;
use serde_json::json;

use super::{AppError, ErrorDetail, ErrorResponse};

/// Router fallback for unknown routes.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    AppError::NotFound(format!("Can't find {target} on this server!"))
}

/// Rewrites error bodies with the raw message, a debug dump and the captured
/// span trace. Responses pass through untouched in production.
///
/// ```ignore
/// let app = router.layer(axum::middleware::from_fn_with_state(
///     Environment::from_env(),
///     expose_error_details,
/// ));
/// ```
pub async fn expose_error_details(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if environment.is_production() {
        return response;
    }

    let Some(detail) = response.extensions_mut().remove::<ErrorDetail>() else {
        return response;
    };

    let status = response.status();
    let mut body = ErrorResponse::new(status, detail.message);
    body.error = Some(json!({
        "statusCode": status.as_u16(),
        "code": detail.code,
        "isOperational": detail.operational,
        "detail": detail.debug,
    }));
    body.stack = Some(detail.stack);

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    (parts, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, middleware, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn failing() -> AppError {
        AppError::Internal("mongo pool closed".into())
    }

    fn app(environment: Environment) -> Router {
        Router::new()
            .route("/boom", get(failing))
            .fallback(not_found)
            .layer(middleware::from_fn_with_state(environment, expose_error_details))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_route_names_the_path() {
        let (status, body) = call(app(Environment::Production), "/api/v1/nope?x=1").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Can't find /api/v1/nope?x=1 on this server!");
    }

    #[tokio::test]
    async fn test_production_hides_internal_details() {
        let (status, body) = call(app(Environment::Production), "/boom").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Something went very wrong!");
        assert!(body.get("error").is_none());
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_development_exposes_raw_message_and_stack() {
        let (status, body) = call(app(Environment::Development), "/boom").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "mongo pool closed");
        assert_eq!(body["error"]["statusCode"], 500);
        assert_eq!(body["error"]["isOperational"], false);
        assert!(body.get("stack").is_some());
    }
}
