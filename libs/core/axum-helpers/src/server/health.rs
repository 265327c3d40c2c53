use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use core_config::AppInfo;
use futures::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

/// A boxed future for health checks with a string error
pub type HealthCheckFuture<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

/// Run readiness checks concurrently.
///
/// The body lists every check as `connected`/`disconnected` next to an
/// overall `status`; any failure turns the response into a 503.
pub async fn run_health_checks(
    checks: Vec<(&str, HealthCheckFuture<'_>)>,
) -> (StatusCode, Json<Value>) {
    let names: Vec<_> = checks.iter().map(|(name, _)| *name).collect();
    let results = join_all(checks.into_iter().map(|(_, check)| check)).await;

    let mut body = Map::new();
    let mut all_healthy = true;

    for (name, result) in names.into_iter().zip(results) {
        let state = match result {
            Ok(()) => "connected",
            Err(e) => {
                tracing::error!(check = name, error = %e, "Readiness check failed");
                all_healthy = false;
                "disconnected"
            }
        };
        body.insert(name.to_string(), json!(state));
    }

    body.insert(
        "status".to_string(),
        json!(if all_healthy { "ready" } else { "not ready" }),
    );

    let status = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(Value::Object(body)))
}

async fn health_handler(State(app): State<AppInfo>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        name: app.name,
        version: app.version,
    })
}

/// `/health` liveness endpoint reporting name and version.
pub fn health_router(app_info: AppInfo) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(app_info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_checks_pass() {
        let checks: Vec<(&str, HealthCheckFuture)> = vec![("database", Box::pin(async { Ok(()) }))];
        let (status, Json(body)) = run_health_checks(checks).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], "connected");
        assert_eq!(body["status"], "ready");
    }

    #[tokio::test]
    async fn test_failing_check_is_unavailable() {
        let checks: Vec<(&str, HealthCheckFuture)> = vec![
            ("database", Box::pin(async { Err("refused".to_string()) })),
            ("smtp", Box::pin(async { Ok(()) })),
        ];
        let (status, Json(body)) = run_health_checks(checks).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["database"], "disconnected");
        assert_eq!(body["smtp"], "connected");
        assert_eq!(body["status"], "not ready");
    }
}
