use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

/// Failures raised by a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value {value:?} for unique field `{field}` in `{collection}`")]
    DuplicateKey {
        collection: String,
        field: String,
        value: String,
    },

    #[error("database error: {0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("document (de)serialization failed: {0}")]
    Serialization(String),
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for StoreError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of the generic CRUD operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("No {0} found with that ID")]
    NotFound(&'static str),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Invalid(String),

    /// A server-side failure outside the store, such as password hashing.
    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ResourceResult<T> = Result<T, ResourceError>;

impl ResourceError {
    /// A single-field violation, reported like any other validation failure.
    pub fn violation(field: &'static str, message: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, ValidationError::new("invalid").with_message(message.into()));
        ResourceError::Validation(errors)
    }
}

/// Unwrap a DTO field that validation has already required.
pub fn require<T>(field: &'static str, value: Option<T>) -> ResourceResult<T> {
    value.ok_or_else(|| ResourceError::violation(field, "is required"))
}

impl From<ResourceError> for AppError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound(_) => AppError::NotFound(err.to_string()),
            ResourceError::Validation(errors) => AppError::Validation(errors),
            ResourceError::Invalid(message) => AppError::InvalidInput(message),
            ResourceError::Internal(message) => AppError::Internal(message),
            ResourceError::Store(StoreError::DuplicateKey { value, .. }) => {
                AppError::DuplicateKey(value)
            }
            ResourceError::Store(other) => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        ResourceError::Store(err).into()
    }
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
