use thiserror::Error;

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// The provider refused or failed to hand the message over
    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error("Email template failed: {0}")]
    Template(String),

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Email configuration error: {0}")]
    Config(String),
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<core_config::ConfigError> for NotificationError {
    fn from(err: core_config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
