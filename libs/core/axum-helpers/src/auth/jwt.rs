use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,        // Subject (user ID)
    pub email: String,      // User email
    pub roles: Vec<String>, // User type at issue time
    pub exp: i64,           // Expiration time
    pub iat: i64,           // Issued at
    pub jti: String,        // JWT ID
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtAuth {
    secret: String,
    access_token_ttl: i64,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_token_ttl: config.access_token_ttl,
        }
    }

    /// Lifetime of tokens produced by [`Self::create_access_token`], in seconds.
    pub fn access_token_ttl(&self) -> i64 {
        self.access_token_ttl
    }

    pub fn create_access_token(
        &self,
        user_id: &str,
        email: &str,
        roles: &[String],
    ) -> eyre::Result<String> {
        self.create_token(user_id, email, roles, self.access_token_ttl)
    }

    fn create_token(
        &self,
        user_id: &str,
        email: &str,
        roles: &[String],
        ttl_seconds: i64,
    ) -> eyre::Result<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            roles: roles.to_vec(),
            exp: (now + Duration::seconds(ttl_seconds)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Verify signature and expiry, returning the decoded claims
    pub fn verify_token(&self, token: &str) -> eyre::Result<JwtClaims> {
        let token_data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("test-secret-key-that-is-long-enough-1234"))
    }

    #[test]
    fn test_token_roundtrip_keeps_claims() {
        let auth = auth();
        let token = auth
            .create_access_token("7", "buyer@example.com", &["buyer".to_string()])
            .unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "buyer@example.com");
        assert_eq!(claims.roles, vec!["buyer".to_string()]);
        assert_eq!(claims.exp - claims.iat, auth.access_token_ttl());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = JwtAuth::new(&JwtConfig::new("another-secret-key-that-is-long-enough"));
        let token = other.create_access_token("1", "a@b.co", &[]).unwrap();
        assert!(auth().verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let auth = JwtAuth::new(
            &JwtConfig::new("test-secret-key-that-is-long-enough-1234").with_access_token_ttl(-600),
        );
        let token = auth.create_access_token("1", "a@b.co", &[]).unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(auth().verify_token("not-a-jwt").is_err());
    }
}
