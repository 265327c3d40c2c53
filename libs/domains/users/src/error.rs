use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("User with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User inactive or deleted")]
    Inactive,

    #[error("Invalid token or email")]
    InvalidConfirmToken,

    #[error("Contact not found: {0}")]
    ContactNotFound(i64),

    #[error("Contact {0} belongs to another user")]
    ContactForbidden(i64),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => AppError::NotFound(format!("User {} not found", id)),
            UserError::DuplicateEmail(_) => {
                AppError::BadRequest("User with this email already exists.".to_string())
            }
            UserError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            UserError::Inactive => AppError::Forbidden("User inactive or deleted.".to_string()),
            UserError::InvalidConfirmToken => {
                AppError::NotFound("Invalid token or email".to_string())
            }
            UserError::ContactNotFound(id) => {
                AppError::NotFound(format!("Contact {} not found", id))
            }
            UserError::ContactForbidden(id) => {
                AppError::Forbidden(format!("Access denied to contact {}", id))
            }
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::PasswordHash(msg) => {
                tracing::error!("Password hash error: {}", msg);
                AppError::InternalServerError(msg)
            }
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
