use axum_helpers::JwtConfig;
use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, env_flag, env_optional, env_or_default, env_parse,
    server::ServerConfig,
};
use database::postgres::PostgresConfig;
use domain_notifications::SmtpConfig;
use std::time::Duration;

pub use core_config::Environment;

/// Where outgoing mail goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MailBackend {
    Smtp,
    /// Kept in process memory; for local runs without a mail server
    Memory,
}

impl FromEnv for MailBackend {
    /// - MAIL_BACKEND: `smtp` (default) or `memory`
    fn from_env() -> Result<Self, ConfigError> {
        match env_or_default("MAIL_BACKEND", "smtp").to_ascii_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                key: "MAIL_BACKEND".to_string(),
                details: format!("expected 'smtp' or 'memory', got '{other}'"),
            }),
        }
    }
}

/// Settings owned by the retail service itself
#[derive(Clone, Debug)]
pub struct RetailConfig {
    /// Prefix of the confirmation links sent by email
    pub public_base_url: String,
    /// Receives a copy of every order receipt
    pub operator_email: Option<String>,
    pub run_migrations: bool,
    pub feed_timeout: Duration,
}

impl FromEnv for RetailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let public_base_url = env_or_default("PUBLIC_BASE_URL", "http://127.0.0.1:8080")
            .trim_end_matches('/')
            .to_string();
        let feed_timeout_secs = env_parse("FEED_FETCH_TIMEOUT_SECS", 30u64)?;
        if feed_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "FEED_FETCH_TIMEOUT_SECS".to_string(),
                details: "must be positive".to_string(),
            });
        }

        Ok(Self {
            public_base_url,
            operator_email: env_optional("ORDER_OPERATOR_EMAIL").filter(|e| !e.trim().is_empty()),
            run_migrations: env_flag("RUN_MIGRATIONS", true)?,
            feed_timeout: Duration::from_secs(feed_timeout_secs),
        })
    }
}

/// Application configuration, composed from the shared config pieces
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: PostgresConfig,
    pub jwt: JwtConfig,
    pub mail: MailBackend,
    pub smtp: SmtpConfig,
    pub retail: RetailConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080 by default
        let database = PostgresConfig::from_env()?; // DATABASE_URL is required
        let jwt = JwtConfig::from_env()?;
        let mail = MailBackend::from_env()?;
        let smtp = SmtpConfig::from_env()?;
        let retail = RetailConfig::from_env()?;

        if environment.is_production() && mail == MailBackend::Memory {
            return Err(eyre::eyre!("MAIL_BACKEND=memory is not allowed in production"));
        }

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            database,
            jwt,
            mail,
            smtp,
            retail,
        })
    }
}
