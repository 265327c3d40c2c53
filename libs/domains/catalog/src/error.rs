use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

/// Errors raised while fetching or reading a shop feed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("Invalid feed: {0}")]
    InvalidYaml(String),

    #[error("KeyError: '{0}'")]
    MissingKey(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Category {0} not found in feed")]
    UnknownCategory(i64),

    #[error("Failed to fetch feed: {0}")]
    Fetch(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Log in required")]
    LoginRequired,

    #[error("Only shops can upload products")]
    NotShop,

    #[error("No feed URL provided")]
    MissingUrl,

    #[error("Malformed feed URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<FeedError> for AppError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Fetch(_) => AppError::BadGateway(err.to_string()),
            _ => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::LoginRequired => AppError::Forbidden("Log in required.".to_string()),
            CatalogError::NotShop => {
                AppError::Forbidden("Only shops can upload products.".to_string())
            }
            CatalogError::MissingUrl => {
                AppError::BadRequest("You should provide a URL".to_string())
            }
            CatalogError::InvalidUrl(_) => AppError::BadRequest("Enter a valid URL.".to_string()),
            CatalogError::Feed(e) => e.into(),
            CatalogError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
