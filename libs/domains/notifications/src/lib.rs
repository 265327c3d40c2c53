//! Notifications Domain
//!
//! Outgoing email for the retail backend: registration confirmation links and
//! order receipts.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ NotificationService │  ← Renders and sends, one call per message
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │   TemplateEngine    │  ← Handlebars, subject/html/text
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │   Email Provider    │  ← SMTP (lettre) or in-memory recorder
//! └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{NotificationService, SmtpConfig, SmtpProvider};
//! use core_config::FromEnv;
//!
//! let provider = SmtpProvider::new(SmtpConfig::from_env()?)?;
//! let service = NotificationService::new(std::sync::Arc::new(provider))?;
//! service
//!     .send_email_confirmation("buyer@example.com", "http://127.0.0.1:8080/api/v1/confirm_email/abc/buyer@example.com")
//!     .await?;
//! ```

pub mod error;
pub mod models;
pub mod providers;
pub mod service;
pub mod templates;

pub use error::{NotificationError, NotificationResult};
pub use models::{EmailConfirmationData, OrderReceipt, ReceiptLine};
pub use providers::{
    EmailContent, EmailProvider, InMemoryEmailProvider, SentEmail, SmtpConfig, SmtpProvider,
};
pub use service::NotificationService;
pub use templates::{RenderedEmail, TemplateEngine};
