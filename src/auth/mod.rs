use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::types::{Role, UserId};

/// Session token claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    /// Cached dashboard role from the session's user metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: impl Into<UserId>, role: Option<Role>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: sub.into(),
            role,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
}

/// Verifies bearer session tokens. Issuing is used by local tooling and tests;
/// in production tokens come from the identity provider sharing the secret.
#[derive(Clone)]
pub struct JwtSessionProvider {
    secret: String,
    expiry_hours: u64,
}

impl JwtSessionProvider {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry_hours,
        }
    }

    pub fn from_config(security: &SecurityConfig) -> Self {
        Self::new(security.jwt_secret.clone(), security.jwt_expiry_hours)
    }

    pub fn issue(&self, user_id: &str, role: Option<Role>) -> Result<String, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        let claims = Claims::new(user_id, role, self.expiry_hours);
        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());

        encode(&Header::default(), &claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());

        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify() {
        let sessions = JwtSessionProvider::new("test-secret", 1);
        let token = sessions.issue("u1", Some(Role::Support)).unwrap();
        let claims = sessions.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Some(Role::Support));
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = JwtSessionProvider::new("one", 1).issue("u1", None).unwrap();
        assert!(matches!(
            JwtSessionProvider::new("two", 1).verify(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn empty_secret_cannot_issue() {
        assert!(matches!(
            JwtSessionProvider::new("", 1).issue("u1", None),
            Err(AuthError::InvalidSecret)
        ));
    }
}
