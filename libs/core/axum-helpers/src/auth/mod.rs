//! Stateless bearer-token authentication.
//!
//! - [`JwtAuth`] issues and verifies HS256 access tokens
//! - [`jwt_auth_middleware`] decodes a presented token into [`JwtClaims`]
//! - [`AuthUser`] is the principal extractor handlers take as an argument
//!
//! ```ignore
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//!
//! let api = Router::new()
//!     .route("/basket", get(basket))
//!     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//!
//! async fn basket(user: AuthUser) -> String {
//!     format!("basket of {}", user.id)
//! }
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod principal;

pub use config::JwtConfig;
pub use jwt::{JwtAuth, JwtClaims};
pub use middleware::jwt_auth_middleware;
pub use principal::AuthUser;
