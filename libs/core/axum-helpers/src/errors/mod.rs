pub mod codes;
pub mod handlers;
pub mod messages;
pub mod responses;

pub use codes::ErrorCode;
pub use handlers::{expose_error_details, not_found};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_error::SpanTrace;
use utoipa::ToSchema;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Error envelope returned by every failing request.
///
/// ```json
/// { "status": "fail", "message": "No tour found with that ID" }
/// ```
///
/// Outside production [`expose_error_details`] adds `error` and `stack`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// `fail` for 4xx, `error` for 5xx
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status_label(status).to_string(),
            message: message.into(),
            error: None,
            stack: None,
        }
    }
}

pub fn status_label(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else {
        "fail"
    }
}

/// Everything the API can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input data. {}", format_validation_errors(.0))]
    Validation(ValidationErrors),

    #[error("{0}")]
    InvalidInput(String),

    /// A path value that does not parse as the field's type
    #[error("Invalid {path}: {value}")]
    Cast { path: String, value: String },

    #[error("Duplicate field value: \"{0}\". Please use another value!")]
    DuplicateKey(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Request body is too large")]
    PayloadTooLarge,

    #[error("{0}")]
    TooManyRequests(String),

    /// Operational 500, such as a mail server refusing a message
    #[error("{0}")]
    ServiceFailure(String),

    /// Programming or unknown error. The message is never shown in production.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn cast_id(value: impl Into<String>) -> Self {
        AppError::Cast {
            path: "_id".to_string(),
            value: value.into(),
        }
    }

    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationError),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidInput),
            AppError::Cast { .. } => (StatusCode::BAD_REQUEST, ErrorCode::InvalidId),
            AppError::DuplicateKey(_) => (StatusCode::BAD_REQUEST, ErrorCode::DuplicateKey),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, ErrorCode::PayloadTooLarge),
            AppError::TooManyRequests(_) => {
                (StatusCode::TOO_MANY_REQUESTS, ErrorCode::TooManyRequests)
            }
            AppError::ServiceFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::ServiceFailure)
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError),
        }
    }

    /// Whether the message is meant for clients as is.
    pub fn is_operational(&self) -> bool {
        !matches!(self, AppError::Internal(_))
    }
}

/// Debug information attached to error responses as an extension.
///
/// Read by [`expose_error_details`] to enrich the body outside production.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    /// Unredacted message
    pub message: String,
    pub debug: String,
    pub operational: bool,
    pub stack: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error_code = code.code(), error = ?self, "request failed");
        } else {
            tracing::info!(error_code = code.code(), %message, "request rejected");
        }

        let public_message = if self.is_operational() {
            message.clone()
        } else {
            code.default_message().to_string()
        };

        let detail = ErrorDetail {
            code,
            message,
            debug: format!("{self:?}"),
            operational: self.is_operational(),
            stack: SpanTrace::capture().to_string(),
        };

        let mut response = (status, Json(ErrorResponse::new(status, public_message))).into_response();
        response.extensions_mut().insert(detail);
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::InvalidInput(rejection.body_text())
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<eyre::Report> for AppError {
    fn from(report: eyre::Report) -> Self {
        AppError::Internal(format!("{report:#}"))
    }
}

/// `"name: A tour must have a name. price: ..."`, fields in alphabetical order.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    collect_violations(errors, "", &mut lines);
    lines.sort();
    lines.join(". ")
}

fn collect_violations(errors: &ValidationErrors, prefix: &str, lines: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(violations) => {
                for violation in violations {
                    let message = violation
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed {} check", violation.code));
                    if *field == "__all__" {
                        lines.push(message);
                    } else {
                        lines.push(format!("{path}: {message}"));
                    }
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_violations(nested, &path, lines),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_violations(nested, &format!("{path}[{index}]"), lines);
                }
            }
        }
    }
}
