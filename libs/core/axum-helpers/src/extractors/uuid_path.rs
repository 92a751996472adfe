use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use uuid::Uuid;

/// The `{id}` path parameter parsed as a UUID.
///
/// Works on routes with several parameters;
/// only `id` is read. A value that is not a UUID is a cast error (400).
///
/// ```ignore
/// async fn get_tour(UuidPath(id): UuidPath) -> String {
///     format!("tour {id}")
/// }
///
/// let app = Router::new().route("/tours/{id}", get(get_tour));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct UuidPath(pub Uuid);

impl<S> FromRequestParts<S> for UuidPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::InvalidInput(e.body_text()))?;

        uuid_param(&params, "id").map(UuidPath)
    }
}

/// Parse a named path parameter as a UUID.
pub fn uuid_param(params: &HashMap<String, String>, name: &str) -> Result<Uuid, AppError> {
    let raw = params
        .get(name)
        .ok_or_else(|| AppError::Internal(format!("route has no `{name}` parameter")))?;

    Uuid::parse_str(raw).map_err(|_| AppError::cast_id(raw.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_param_parses_valid_id() {
        let id = Uuid::new_v4();
        let params = HashMap::from([("id".to_string(), id.to_string())]);
        assert_eq!(uuid_param(&params, "id").unwrap(), id);
    }

    #[test]
    fn test_uuid_param_rejects_garbage_as_cast_error() {
        let params = HashMap::from([("tourId".to_string(), "5c88fa8cf4afda39709c2955".to_string())]);
        let err = uuid_param(&params, "tourId").unwrap_err();
        assert_eq!(err.to_string(), "Invalid _id: 5c88fa8cf4afda39709c2955");
    }

    #[test]
    fn test_uuid_param_missing_name_is_internal() {
        let err = uuid_param(&HashMap::new(), "id").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
