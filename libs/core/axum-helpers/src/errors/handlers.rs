use axum::{http::StatusCode, response::Response};

use super::{ErrorCode, error_response};

/// Router fallback for unknown paths.
pub async fn not_found() -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        ErrorCode::NotFound,
        "The requested resource was not found",
        None,
    )
}

/// Method fallback for known paths with an unsupported verb.
pub async fn method_not_allowed() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        ErrorCode::BadRequest,
        "The HTTP method is not allowed for this resource",
        None,
    )
}
