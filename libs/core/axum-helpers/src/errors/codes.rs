//! Integer and string identifiers for every [`AppError`](super::AppError) kind.
//!
//! The integer codes end up in structured log fields (`error_code = 1004`)
//! so log queries can group failures without parsing messages.
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! assert_eq!(ErrorCode::NotFound.as_str(), "NOT_FOUND");
//! assert_eq!(ErrorCode::NotFound.code(), 1004);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// A field violated one of its declared constraints
    ValidationError,
    /// A path identifier could not be cast to its type
    InvalidId,
    /// Malformed or semantically wrong request body
    InvalidInput,
    NotFound,
    Unauthorized,
    Forbidden,
    /// A unique index rejected the write
    DuplicateKey,
    PayloadTooLarge,
    TooManyRequests,

    // Server errors (5000-5999)
    /// Expected failure of a downstream service, message is safe to show
    ServiceFailure,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidId => "INVALID_ID",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::ServiceFailure => "SERVICE_FAILURE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Integer code for logs and metrics.
    ///
    /// - 1000-1999: client errors
    /// - 5000-5999: server errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidId => 1002,
            Self::InvalidInput => 1003,
            Self::NotFound => 1004,
            Self::Unauthorized => 1006,
            Self::Forbidden => 1007,
            Self::DuplicateKey => 1008,
            Self::PayloadTooLarge => 1009,
            Self::TooManyRequests => 1010,

            Self::ServiceFailure => 5001,
            Self::InternalError => 5002,
        }
    }

    /// Fallback message when an error carries none of its own.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Invalid input data.",
            Self::InvalidId => "Invalid identifier",
            Self::InvalidInput => "Invalid request body",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Authentication required",
            Self::Forbidden => "You do not have permission to perform this action",
            Self::DuplicateKey => "Duplicate field value. Please use another value!",
            Self::PayloadTooLarge => "Request body is too large",
            Self::TooManyRequests => "Too many requests from this IP, please try again in an hour!",
            Self::ServiceFailure => "A downstream service failed",
            Self::InternalError => "Something went very wrong!",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.code() >= 5000
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_string_representation() {
        assert_eq!(ErrorCode::ValidationError.as_str(), "VALIDATION_ERROR");
        assert_eq!(ErrorCode::DuplicateKey.as_str(), "DUPLICATE_KEY");
        assert_eq!(ErrorCode::InvalidId.to_string(), "INVALID_ID");
    }

    #[test]
    fn test_error_code_ranges() {
        assert!(!ErrorCode::TooManyRequests.is_server_error());
        assert!(ErrorCode::ServiceFailure.is_server_error());
        assert!(ErrorCode::InternalError.is_server_error());
    }

    #[test]
    fn test_internal_default_message_is_generic() {
        assert_eq!(
            ErrorCode::InternalError.default_message(),
            "Something went very wrong!"
        );
    }

    #[test]
    fn test_error_code_serde() {
        let json = serde_json::to_string(&ErrorCode::PayloadTooLarge).unwrap();
        assert_eq!(json, "\"PAYLOAD_TOO_LARGE\"");
        let code: ErrorCode = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert_eq!(code, ErrorCode::NotFound);
    }
}
