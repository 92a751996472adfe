use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use resource_handler::{ResourceError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TourError {
    #[error("Invalid year: {0}")]
    InvalidYear(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl From<StoreError> for TourError {
    fn from(err: StoreError) -> Self {
        TourError::Resource(err.into())
    }
}

pub type TourResult<T> = Result<T, TourError>;

impl From<TourError> for AppError {
    fn from(err: TourError) -> Self {
        match err {
            TourError::InvalidYear(value) => AppError::Cast {
                path: "year".to_string(),
                value,
            },
            TourError::Resource(err) => err.into(),
        }
    }
}

impl IntoResponse for TourError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
