//! Shared application state.
//!
//! Built once in `main` and handed to the route builders. Cloning is cheap:
//! the pool, the JWT keys and the notification service are all handles.

use axum_helpers::JwtAuth;
use domain_notifications::NotificationService;

#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL connection pool
    pub db: database::postgres::DatabaseConnection,
    pub jwt: JwtAuth,
    /// Confirmation links and order receipts
    pub notifications: NotificationService,
}
