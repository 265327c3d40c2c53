//! Audit trail for security-relevant actions.
//!
//! Events go to the `audit` tracing target so they can be routed separately.
//!
//! ```ignore
//! AuditEvent::new(Some(user.id), "order.confirm", Some(format!("order:{}", id)), AuditOutcome::Success)
//!     .with_ip(extract_ip_from_headers(&headers))
//!     .with_user_agent(extract_user_agent(&headers))
//!     .with_details(json!({"items": 2}))
//!     .log();
//! ```

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
    /// Rejected by a permission or ownership check
    Denied,
}

#[derive(Debug, Serialize)]
pub struct AuditEvent {
    /// Acting user, `None` for anonymous calls such as registration
    pub user_id: Option<i64>,
    /// Dotted action name, e.g. `catalog.upload`
    pub action: String,
    /// Affected resource, e.g. `order:12`
    pub resource: Option<String>,
    pub outcome: AuditOutcome,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        user_id: Option<i64>,
        action: impl Into<String>,
        resource: Option<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            user_id,
            action: action.into(),
            resource,
            outcome,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_ip(mut self, ip: Option<String>) -> Self {
        self.ip_address = ip;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn log(self) {
        tracing::info!(
            target: "audit",
            user_id = self.user_id,
            action = %self.action,
            resource = self.resource,
            outcome = ?self.outcome,
            ip = self.ip_address,
            user_agent = self.user_agent,
            timestamp = %self.timestamp,
            details = ?self.details,
            "audit event"
        );
    }
}

/// Client IP from `X-Forwarded-For` (first hop) or `X-Real-IP`.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
