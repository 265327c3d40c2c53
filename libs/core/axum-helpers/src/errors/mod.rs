pub mod codes;
pub mod handlers;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Error body returned by every endpoint.
///
/// The human-readable message lives under the `Error` key so clients of the
/// retail API can branch on `Error` vs `Success` alone.
///
/// ```json
/// {
///   "code": 1009,
///   "kind": "BUSINESS_RULE",
///   "Error": "Order has already been processed",
///   "details": { "Order status": "confirmed" }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier
    pub kind: String,
    /// Human-readable error message
    #[serde(rename = "Error")]
    pub message: String,
    /// Optional structured details (validation field errors, partial results)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Plain acknowledgement body: `{"Success": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    #[serde(rename = "Success")]
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON parsing error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A request that is well-formed but violates a domain rule
    /// (insufficient stock, invalid status transition). Answered with 403.
    #[error("Business rule violated: {message}")]
    BusinessRule {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn business_rule(message: impl Into<String>, details: serde_json::Value) -> Self {
        AppError::BusinessRule {
            message: message.into(),
            details: Some(details),
        }
    }

    fn parts(self) -> (StatusCode, ErrorCode, String, Option<serde_json::Value>) {
        match self {
            AppError::SerdeJson(e) => {
                tracing::error!(error_code = ErrorCode::SerdeJsonError.code(), "JSON error: {:?}", e);
                internal(ErrorCode::SerdeJsonError)
            }
            AppError::Database(e) => {
                tracing::error!(error_code = ErrorCode::DatabaseError.code(), "Database error: {:?}", e);
                internal(ErrorCode::DatabaseError)
            }
            AppError::Io(e) => {
                tracing::error!(error_code = ErrorCode::IoError.code(), "I/O error: {:?}", e);
                internal(ErrorCode::IoError)
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(error_code = ErrorCode::JsonExtraction.code(), "JSON extraction error: {:?}", e);
                // Malformed payloads are client validation failures, not 422s.
                let status = if matches!(
                    e,
                    JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_)
                ) {
                    StatusCode::BAD_REQUEST
                } else {
                    e.status()
                };
                (status, ErrorCode::JsonExtraction, e.body_text(), None)
            }
            AppError::ValidationError(e) => {
                tracing::info!(error_code = ErrorCode::ValidationError.code(), "Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::ValidationError,
                    ErrorCode::ValidationError.default_message().to_string(),
                    serde_json::to_value(&e).ok(),
                )
            }
            AppError::BadRequest(msg) => {
                tracing::info!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, ErrorCode::BadRequest, msg, None)
            }
            AppError::Unauthorized(msg) => {
                tracing::info!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg, None)
            }
            AppError::Forbidden(msg) => {
                tracing::info!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, ErrorCode::Forbidden, msg, None)
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg, None)
            }
            AppError::Conflict(msg) => {
                tracing::info!("Conflict: {}", msg);
                (StatusCode::CONFLICT, ErrorCode::Conflict, msg, None)
            }
            AppError::BusinessRule { message, details } => {
                tracing::warn!(error_code = ErrorCode::BusinessRule.code(), "Business rule violated: {}", message);
                (StatusCode::FORBIDDEN, ErrorCode::BusinessRule, message, details)
            }
            AppError::BadGateway(msg) => {
                tracing::warn!(error_code = ErrorCode::BadGateway.code(), "Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, ErrorCode::BadGateway, msg, None)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(error_code = ErrorCode::InternalError.code(), "Internal server error: {}", msg);
                internal(ErrorCode::InternalError)
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::ServiceUnavailable, msg, None)
            }
        }
    }
}

/// Internal failures never leak their cause to the client.
fn internal(code: ErrorCode) -> (StatusCode, ErrorCode, String, Option<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        code,
        code.default_message().to_string(),
        None,
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        error_response(status, code, message, details)
    }
}

/// Build an error response outside of [`AppError`] (fallbacks, middleware).
pub fn error_response(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> Response {
    let body = Json(ErrorResponse {
        code: code.code(),
        kind: code.as_str().to_string(),
        message: message.into(),
        details,
    });

    (status, body).into_response()
}
