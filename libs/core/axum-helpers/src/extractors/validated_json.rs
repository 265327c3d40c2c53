//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor that runs [`Validate`] after deserializing.
///
/// Syntax and shape errors are answered with 400 like field errors, so every
/// malformed body produces the same `{"Error": ...}` envelope.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct NewContact {
///     #[validate(length(min = 1, max = 50))]
///     city: String,
/// }
///
/// async fn add_contact(ValidatedJson(payload): ValidatedJson<NewContact>) -> String {
///     payload.city
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}
