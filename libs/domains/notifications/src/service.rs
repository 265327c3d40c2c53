//! Renders and delivers the emails the retail flows trigger.

use crate::error::NotificationResult;
use crate::models::{EmailConfirmationData, OrderReceipt};
use crate::providers::{EmailContent, EmailProvider, SentEmail};
use crate::templates::{RenderedEmail, TemplateEngine};
use std::sync::Arc;
use tracing::info;

/// Service for sending notification emails synchronously through a provider.
#[derive(Clone)]
pub struct NotificationService {
    provider: Arc<dyn EmailProvider>,
    templates: TemplateEngine,
}

impl NotificationService {
    pub fn new(provider: Arc<dyn EmailProvider>) -> NotificationResult<Self> {
        Ok(Self {
            provider,
            templates: TemplateEngine::new()?,
        })
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn health_check(&self) -> NotificationResult<bool> {
        self.provider.health_check().await
    }

    /// Email the account-activation link to `to`.
    pub async fn send_email_confirmation(&self, to: &str, link: &str) -> NotificationResult<SentEmail> {
        let rendered = self.templates.render_email_confirmation(&EmailConfirmationData {
            email: to.to_string(),
            confirmation_url: link.to_string(),
        })?;

        self.deliver(to, rendered).await
    }

    /// Email an order receipt to `to` (the buyer or the store operator).
    pub async fn send_order_receipt(
        &self,
        to: &str,
        receipt: &OrderReceipt,
    ) -> NotificationResult<SentEmail> {
        let rendered = self.templates.render_order_receipt(receipt)?;
        self.deliver(to, rendered).await
    }

    async fn deliver(&self, to: &str, rendered: RenderedEmail) -> NotificationResult<SentEmail> {
        let content = EmailContent {
            to_email: to.to_string(),
            subject: rendered.subject,
            html_body: rendered.html,
            text_body: rendered.text,
        };

        let sent = self.provider.send(&content).await?;
        info!(
            provider = self.provider.name(),
            to = %to,
            subject = %content.subject,
            "Notification delivered"
        );
        Ok(sent)
    }
}
