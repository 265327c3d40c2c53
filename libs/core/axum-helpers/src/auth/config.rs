use core_config::{ConfigError, FromEnv, env_parse, env_required};

/// Default lifetime of an access token in seconds.
pub const DEFAULT_ACCESS_TOKEN_TTL: i64 = 3600;

/// JWT signing configuration.
///
/// Environment:
/// - `JWT_SECRET` (required, at least 32 bytes)
/// - `JWT_ACCESS_TTL_SECS` (default 3600)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl: i64,
}

impl JwtConfig {
    /// # Panics
    /// Panics if the secret is shorter than 32 bytes.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= 32,
            "JWT secret must be at least 32 characters"
        );
        Self {
            secret,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
        }
    }

    pub fn with_access_token_ttl(mut self, seconds: i64) -> Self {
        self.access_token_ttl = seconds;
        self
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;

        if secret.len() < 32 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_SECRET".to_string(),
                details: format!("must be at least 32 characters (got {})", secret.len()),
            });
        }

        let access_token_ttl = env_parse("JWT_ACCESS_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL)?;
        if access_token_ttl <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_ACCESS_TTL_SECS".to_string(),
                details: "must be positive".to_string(),
            });
        }

        Ok(Self {
            secret,
            access_token_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

    #[test]
    #[should_panic(expected = "JWT secret must be at least 32 characters")]
    fn test_jwt_config_new_too_short() {
        JwtConfig::new("short");
    }

    #[test]
    fn test_jwt_config_from_env_defaults_ttl() {
        temp_env::with_vars(
            [("JWT_SECRET", Some(SECRET)), ("JWT_ACCESS_TTL_SECS", None)],
            || {
                let config = JwtConfig::from_env().unwrap();
                assert_eq!(config.secret, SECRET);
                assert_eq!(config.access_token_ttl, DEFAULT_ACCESS_TOKEN_TTL);
            },
        );
    }

    #[test]
    fn test_jwt_config_from_env_custom_ttl() {
        temp_env::with_vars(
            [("JWT_SECRET", Some(SECRET)), ("JWT_ACCESS_TTL_SECS", Some("120"))],
            || {
                assert_eq!(JwtConfig::from_env().unwrap().access_token_ttl, 120);
            },
        );
    }

    #[test]
    fn test_jwt_config_from_env_rejects_bad_values() {
        temp_env::with_var_unset("JWT_SECRET", || {
            assert!(JwtConfig::from_env().unwrap_err().to_string().contains("JWT_SECRET"));
        });
        temp_env::with_var("JWT_SECRET", Some("short"), || {
            assert!(JwtConfig::from_env().unwrap_err().to_string().contains("32 characters"));
        });
        temp_env::with_vars(
            [("JWT_SECRET", Some(SECRET)), ("JWT_ACCESS_TTL_SECS", Some("0"))],
            || {
                assert!(JwtConfig::from_env().is_err());
            },
        );
    }
}
