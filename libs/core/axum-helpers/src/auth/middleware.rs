use super::jwt::JwtAuth;
use crate::errors::{ErrorCode, error_response};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

/// Extract JWT from Authorization header or cookie
fn extract_token_from_request(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(|s| s.trim().to_string()))
        .or_else(|| {
            headers
                .get("cookie")
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        let (name, value) = cookie.trim().split_once('=')?;
                        (name == "access_token").then(|| value.to_string())
                    })
                })
        })
        .filter(|t| !t.is_empty())
}

/// Decode a presented bearer token into [`JwtClaims`](super::JwtClaims).
///
/// Requests without a token pass through anonymously; handlers decide
/// whether a principal is required through [`AuthUser`](super::AuthUser).
/// A token that is present but invalid or expired is rejected with 401.
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token_from_request(&headers) else {
        return next.run(request).await;
    };

    match auth.verify_token(&token) {
        Ok(claims) => {
            tracing::debug!(user_id = %claims.sub, "Authenticated request");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!("JWT verification failed: {}", e);
            error_response(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Invalid or expired token",
                None,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtClaims, JwtConfig};
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;

    async fn whoami(request: Request) -> String {
        request
            .extensions()
            .get::<JwtClaims>()
            .map(|c| c.sub.clone())
            .unwrap_or_else(|| "anonymous".into())
    }

    fn app(auth: JwtAuth) -> Router {
        Router::new()
            .route("/", get(whoami))
            .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware))
    }

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("middleware-test-secret-long-enough-123"))
    }

    async fn call(app: Router, header: Option<(&str, String)>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_anonymous_request_passes_through() {
        let (status, body) = call(app(auth()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn test_bearer_token_inserts_claims() {
        let auth = auth();
        let token = auth.create_access_token("12", "a@b.co", &[]).unwrap();
        let (status, body) = call(app(auth), Some(("authorization", format!("Bearer {}", token)))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "12");
    }

    #[tokio::test]
    async fn test_cookie_token_inserts_claims() {
        let auth = auth();
        let token = auth.create_access_token("5", "a@b.co", &[]).unwrap();
        let (_, body) = call(app(auth), Some(("cookie", format!("theme=dark; access_token={}", token)))).await;
        assert_eq!(body, "5");
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let (status, _) = call(app(auth()), Some(("authorization", "Bearer nope".into()))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
