use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use axum_helpers::AppError;
use query_features::QueryDescriptor;

/// The request's query string as a [`QueryDescriptor`].
#[derive(Debug, Clone, Default)]
pub struct ListQuery(pub QueryDescriptor);

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::InvalidInput(e.body_text()))?;
        Ok(ListQuery(QueryDescriptor::from_pairs(pairs)))
    }
}
