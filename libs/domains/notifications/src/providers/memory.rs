//! Recording provider for tests and local runs without an SMTP server.

use super::{EmailContent, EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Keeps every message in memory instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEmailProvider {
    sent: Arc<RwLock<Vec<EmailContent>>>,
    fail: bool,
}

impl InMemoryEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose every send fails, for exercising delivery-failure paths.
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    /// Messages recorded so far, oldest first.
    pub async fn sent(&self) -> Vec<EmailContent> {
        self.sent.read().await.clone()
    }

    /// Messages recorded for one recipient.
    pub async fn sent_to(&self, email: &str) -> Vec<EmailContent> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|m| m.to_email.eq_ignore_ascii_case(email))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EmailProvider for InMemoryEmailProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        if self.fail {
            return Err(NotificationError::Delivery(
                "in-memory provider configured to fail".to_string(),
            ));
        }

        let mut sent = self.sent.write().await;
        sent.push(email.clone());

        info!(to = %email.to_email, subject = %email.subject, "Recorded email");

        Ok(SentEmail {
            message_id: Some(format!("memory-{}", sent.len())),
            accepted: true,
        })
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn health_check(&self) -> NotificationResult<bool> {
        Ok(!self.fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> EmailContent {
        EmailContent {
            to_email: to.to_string(),
            subject: "Hello".to_string(),
            html_body: "<p>Hello</p>".to_string(),
            text_body: "Hello".to_string(),
        }
    }

    #[tokio::test]
    async fn test_records_messages_in_order() {
        let provider = InMemoryEmailProvider::new();
        provider.send(&message("a@example.com")).await.unwrap();
        let sent = provider.send(&message("b@example.com")).await.unwrap();

        assert_eq!(sent.message_id.as_deref(), Some("memory-2"));
        let all = provider.sent().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].to_email, "a@example.com");
        assert_eq!(provider.sent_to("B@example.com").await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_provider_records_nothing() {
        let provider = InMemoryEmailProvider::failing();

        assert!(provider.send(&message("a@example.com")).await.is_err());
        assert!(provider.sent().await.is_empty());
        assert!(!provider.health_check().await.unwrap());
    }
}
