//! Mail transports behind one trait: SMTP for real delivery, an in-memory
//! recorder for tests and local runs.

mod memory;
mod smtp;

pub use memory::InMemoryEmailProvider;
pub use smtp::{SmtpConfig, SmtpProvider};

use crate::error::NotificationResult;
use async_trait::async_trait;

/// Receipt from the transport
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub message_id: Option<String>,
    pub accepted: bool,
}

/// A rendered message addressed to one recipient
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailContent {
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail>;

    /// Short label used in logs
    fn name(&self) -> &'static str;

    /// `Ok(false)` when the transport is reachable but not usable
    async fn health_check(&self) -> NotificationResult<bool>;
}
