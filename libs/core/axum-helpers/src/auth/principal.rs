use super::jwt::JwtClaims;
use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;

/// Authenticated caller, built from the claims the auth middleware stored.
///
/// Take `AuthUser` for endpoints that require a login (401 otherwise) or
/// `Option<AuthUser>` when the handler chooses its own rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn new(id: i64, email: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            id,
            email: email.into(),
            roles,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    fn from_claims(claims: &JwtClaims) -> Option<Self> {
        let id = claims.sub.parse().ok()?;
        Some(Self::new(id, claims.email.clone(), claims.roles.clone()))
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<JwtClaims>()
            .and_then(AuthUser::from_claims)
            .ok_or_else(|| AppError::Unauthorized("Log in required.".to_string()))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<JwtClaims>()
            .and_then(AuthUser::from_claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> JwtClaims {
        JwtClaims {
            sub: sub.to_string(),
            email: "shop@example.com".to_string(),
            roles: vec!["shop".to_string()],
            exp: 0,
            iat: 0,
            jti: "jti".to_string(),
        }
    }

    #[test]
    fn test_from_claims_parses_numeric_subject() {
        let user = AuthUser::from_claims(&claims("42")).unwrap();
        assert_eq!(user.id, 42);
        assert!(user.has_role("SHOP"));
        assert!(!user.has_role("buyer"));
    }

    #[test]
    fn test_from_claims_rejects_non_numeric_subject() {
        assert!(AuthUser::from_claims(&claims("abc")).is_none());
    }
}
