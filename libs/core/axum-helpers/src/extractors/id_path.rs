use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Response},
};

/// Numeric primary key taken from a single `{id}` path segment.
///
/// ```ignore
/// async fn get_order(IdPath(id): IdPath) -> String {
///     format!("order {}", id)
/// }
///
/// let app = Router::new().route("/order/{id}", get(get_order));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub i64);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;

        match raw.parse::<i64>() {
            Ok(id) if id > 0 => Ok(IdPath(id)),
            _ => Err(AppError::BadRequest(format!("Invalid id: {}", raw)).into_response()),
        }
    }
}
