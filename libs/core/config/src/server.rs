use crate::{ConfigError, FromEnv, env_or_default, env_parse};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Where the HTTP listener binds (`HOST`, `PORT`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, ready for `TcpListener::bind`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl FromEnv for ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", DEFAULT_HOST);
        if host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "HOST".to_string(),
                details: "must not be blank".to_string(),
            });
        }

        Ok(Self::new(host, env_parse("PORT", DEFAULT_PORT)?))
    }
}
