//! # Axum Helpers
//!
//! Shared building blocks for the retail HTTP services.
//!
//! - **[`auth`]**: stateless JWT issue/verify, middleware, [`AuthUser`] principal
//! - **[`server`]**: router assembly with OpenAPI UIs, health checks, graceful shutdown
//! - **[`http`]**: CORS and security header layers
//! - **[`errors`]**: [`AppError`] and the `{"Error": ...}` / `{"Success": ...}` bodies
//! - **[`extractors`]**: [`IdPath`] and [`ValidatedJson`]
//! - **[`audit`]**: structured audit events

pub mod audit;
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{AuthUser, JwtAuth, JwtClaims, JwtConfig, jwt_auth_middleware};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks,
};

pub use errors::{AppError, ErrorCode, ErrorResponse, SuccessResponse};

pub use extractors::{IdPath, ValidatedJson};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
