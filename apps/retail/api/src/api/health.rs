//! Readiness probe backed by real dependency checks.

use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};

/// Pings the database and the mail provider.
pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![
        (
            "database",
            Box::pin(async {
                database::postgres::check_health(&state.db)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
        (
            "mail",
            Box::pin(async {
                match state.notifications.health_check().await {
                    Ok(true) => Ok(()),
                    Ok(false) => Err("Mail provider unavailable".to_string()),
                    Err(e) => Err(format!("Mail provider check failed: {}", e)),
                }
            }),
        ),
    ];

    run_health_checks(checks).await.into_response()
}
