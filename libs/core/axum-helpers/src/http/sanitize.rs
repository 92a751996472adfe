use crate::errors::AppError;
use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::header::{CONTENT_LENGTH, CONTENT_TYPE},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

/// Maximum body size the sanitizer will buffer.
#[derive(Debug, Clone, Copy)]
pub struct SanitizeLimit(pub usize);

/// Removes object keys that start with `$` or contain `.`, at any depth.
///
/// Returns how many keys were dropped.
pub fn strip_operator_keys(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| !key.starts_with('$') && !key.contains('.'));
            let mut removed = before - map.len();
            for nested in map.values_mut() {
                removed += strip_operator_keys(nested);
            }
            removed
        }
        Value::Array(items) => items.iter_mut().map(strip_operator_keys).sum(),
        _ => 0,
    }
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Strips MongoDB operator keys from JSON request bodies.
///
/// Bodies that are not valid JSON pass through untouched so the handler's
/// extractor reports the syntax error.
pub async fn sanitize_json_body(
    State(SanitizeLimit(limit)): State<SanitizeLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !is_json(&request) {
        return Ok(next.run(request).await);
    }

    let (mut parts, body) = request.into_parts();
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| AppError::PayloadTooLarge)?;

    let body = match serde_json::from_slice::<Value>(&bytes) {
        Ok(mut value) => {
            let removed = strip_operator_keys(&mut value);
            if removed == 0 {
                Body::from(bytes)
            } else {
                tracing::warn!(removed, "dropped operator keys from request body");
                parts.headers.remove(CONTENT_LENGTH);
                Body::from(serde_json::to_vec(&value).map_err(|e| AppError::Internal(e.to_string()))?)
            }
        }
        Err(_) => Body::from(bytes),
    };

    Ok(next.run(Request::from_parts(parts, body)).await)
}
