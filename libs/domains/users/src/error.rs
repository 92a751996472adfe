use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_notifications::NotificationError;
use resource_handler::{ResourceError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Please provide email and password!")]
    MissingCredentials,

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Your current password is wrong.")]
    WrongCurrentPassword,

    #[error("There is no user with email address.")]
    UnknownEmail,

    #[error("Token is invalid or has expired")]
    InvalidResetToken,

    #[error("This route is not for password updates. Please use /updateMyPassword.")]
    PasswordUpdateNotAllowed,

    #[error("There was an error sending the email. Try again later!")]
    EmailDelivery(#[source] NotificationError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    App(#[from] AppError),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        UserError::Resource(err.into())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::MissingCredentials | UserError::InvalidResetToken | UserError::PasswordUpdateNotAllowed => {
                AppError::InvalidInput(err.to_string())
            }
            UserError::InvalidCredentials | UserError::WrongCurrentPassword => {
                AppError::Unauthenticated(err.to_string())
            }
            UserError::UnknownEmail => AppError::NotFound(err.to_string()),
            UserError::EmailDelivery(ref source) => {
                tracing::error!(error = %source, "password reset email failed");
                AppError::ServiceFailure(err.to_string())
            }
            UserError::PasswordHash(message) => AppError::Internal(message),
            UserError::Resource(inner) => inner.into(),
            UserError::App(inner) => inner,
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status(err: UserError) -> StatusCode {
        AppError::from(err).status_and_code().0
    }

    #[test]
    fn test_client_errors() {
        assert_eq!(status(UserError::MissingCredentials), StatusCode::BAD_REQUEST);
        assert_eq!(status(UserError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(UserError::WrongCurrentPassword), StatusCode::UNAUTHORIZED);
        assert_eq!(status(UserError::UnknownEmail), StatusCode::NOT_FOUND);
        assert_eq!(status(UserError::InvalidResetToken), StatusCode::BAD_REQUEST);
        assert_eq!(status(UserError::PasswordUpdateNotAllowed), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_email_failure_is_operational() {
        let app = AppError::from(UserError::EmailDelivery(NotificationError::ProviderError(
            "connection refused".into(),
        )));
        assert_eq!(app.status_and_code().0, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(app.is_operational());
        assert_eq!(app.to_string(), "There was an error sending the email. Try again later!");
    }

    #[test]
    fn test_hashing_failures_are_server_errors() {
        let direct = UserError::PasswordHash("invalid salt".into());
        let during_create = UserError::from(ResourceError::Internal("Password hashing error: invalid salt".into()));

        assert_eq!(status(direct), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(during_create), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_passes_through() {
        let app = AppError::from(UserError::from(ResourceError::NotFound("user")));
        assert_eq!(app.to_string(), "No user found with that ID");
    }
}
