//! Error codes carried in every [`ErrorResponse`](super::ErrorResponse).
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::BusinessRule;
//! assert_eq!(code.as_str(), "BUSINESS_RULE");
//! assert_eq!(code.code(), 1009);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    ValidationError,
    InvalidPath,
    JsonExtraction,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    /// Well-formed request rejected by a domain rule
    BusinessRule,
    BadRequest,

    // Server errors
    InternalError,
    ServiceUnavailable,
    /// Upstream (e.g. catalog feed host) failed
    BadGateway,

    // Storage (2000-2999)
    DatabaseError,

    // I/O (4000-4999)
    IoError,

    // Serialization (5000-5999)
    SerdeJsonError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidPath => "INVALID_PATH",
            Self::JsonExtraction => "JSON_EXTRACTION",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::BusinessRule => "BUSINESS_RULE",
            Self::BadRequest => "BAD_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::BadGateway => "BAD_GATEWAY",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::IoError => "IO_ERROR",
            Self::SerdeJsonError => "SERDE_JSON_ERROR",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidPath => 1002,
            Self::JsonExtraction => 1003,
            Self::NotFound => 1004,
            Self::InternalError => 1005,
            Self::Unauthorized => 1006,
            Self::Forbidden => 1007,
            Self::Conflict => 1008,
            Self::BusinessRule => 1009,
            Self::BadRequest => 1010,
            Self::ServiceUnavailable => 1011,
            Self::BadGateway => 1012,
            Self::DatabaseError => 2001,
            Self::IoError => 4001,
            Self::SerdeJsonError => 5001,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidPath => "Invalid path parameter",
            Self::JsonExtraction => "Failed to parse request body",
            Self::NotFound => "Resource not found",
            Self::Unauthorized => "Authentication required",
            Self::Forbidden => "Access forbidden",
            Self::Conflict => "Resource already exists",
            Self::BusinessRule => "Request rejected",
            Self::BadRequest => "Bad request",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::BadGateway => "Upstream service failed",
            Self::DatabaseError => "Database error occurred",
            Self::IoError => "I/O error occurred",
            Self::SerdeJsonError => "Failed to process JSON",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let all = [
            ErrorCode::ValidationError,
            ErrorCode::InvalidPath,
            ErrorCode::JsonExtraction,
            ErrorCode::NotFound,
            ErrorCode::Unauthorized,
            ErrorCode::Forbidden,
            ErrorCode::Conflict,
            ErrorCode::BusinessRule,
            ErrorCode::BadRequest,
            ErrorCode::InternalError,
            ErrorCode::ServiceUnavailable,
            ErrorCode::BadGateway,
            ErrorCode::DatabaseError,
            ErrorCode::IoError,
            ErrorCode::SerdeJsonError,
        ];
        let mut codes: Vec<i32> = all.iter().map(|c| c.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&ErrorCode::BadGateway).unwrap();
        assert_eq!(json, format!("\"{}\"", ErrorCode::BadGateway.as_str()));
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::NotFound.to_string(), "NOT_FOUND");
    }
}
