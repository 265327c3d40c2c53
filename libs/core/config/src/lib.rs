//! Environment-driven configuration shared by the retail service crates.
//!
//! Every config struct implements [`FromEnv`]; binaries assemble them once at
//! startup and hand the pieces to the crates that need them.

pub mod server;
pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Invalid value for '{key}': {details}")]
    InvalidValue { key: String, details: String },
}

/// Application environment
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Name and version of the running binary, reported by `/health`.
#[derive(Clone, Copy, Debug)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Builds an [`AppInfo`] from the calling crate's Cargo metadata.
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::AppInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    };
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load and parse environment variable or return error
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Optional variable; empty values count as unset.
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a variable into `T`, falling back to `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Boolean flag accepting `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn env_flag(key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = env_optional(key) else {
        return Ok(default);
    };

    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        for value in ["production", "PRODUCTION", "Production"] {
            temp_env::with_var("APP_ENV", Some(value), || {
                assert_eq!(Environment::from_env(), Environment::Production);
            });
        }
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("RETAIL_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("RETAIL_TEST_VAR", "default"), "value");
        });
        temp_env::with_var_unset("RETAIL_TEST_VAR", || {
            assert_eq!(env_or_default("RETAIL_TEST_VAR", "default"), "default");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("RETAIL_REQUIRED", || {
            let err = env_required("RETAIL_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("RETAIL_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_optional_treats_blank_as_unset() {
        temp_env::with_var("RETAIL_OPTIONAL", Some("  "), || {
            assert_eq!(env_optional("RETAIL_OPTIONAL"), None);
        });
        temp_env::with_var("RETAIL_OPTIONAL", Some("ops@example.com"), || {
            assert_eq!(
                env_optional("RETAIL_OPTIONAL").as_deref(),
                Some("ops@example.com")
            );
        });
    }

    #[test]
    fn test_env_parse() {
        temp_env::with_var("RETAIL_NUMBER", Some("42"), || {
            assert_eq!(env_parse::<u32>("RETAIL_NUMBER", 1).unwrap(), 42);
        });
        temp_env::with_var_unset("RETAIL_NUMBER", || {
            assert_eq!(env_parse::<u32>("RETAIL_NUMBER", 1).unwrap(), 1);
        });
        temp_env::with_var("RETAIL_NUMBER", Some("many"), || {
            let err = env_parse::<u32>("RETAIL_NUMBER", 1).unwrap_err();
            assert!(err.to_string().contains("RETAIL_NUMBER"));
        });
    }

    #[test]
    fn test_env_flag() {
        temp_env::with_var("RETAIL_FLAG", Some("Yes"), || {
            assert!(env_flag("RETAIL_FLAG", false).unwrap());
        });
        temp_env::with_var("RETAIL_FLAG", Some("0"), || {
            assert!(!env_flag("RETAIL_FLAG", true).unwrap());
        });
        temp_env::with_var_unset("RETAIL_FLAG", || {
            assert!(env_flag("RETAIL_FLAG", true).unwrap());
        });
        temp_env::with_var("RETAIL_FLAG", Some("maybe"), || {
            assert!(env_flag("RETAIL_FLAG", true).is_err());
        });
    }

    #[test]
    fn test_app_info_macro_reads_package_metadata() {
        let info = app_info!();
        assert_eq!(info.name, "core_config");
        assert!(!info.version.is_empty());
    }
}
