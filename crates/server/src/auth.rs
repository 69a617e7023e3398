//! Bearer-token identity.
//!
//! Tokens are HS256 JWTs issued by the main Folio API. The discover
//! endpoints only need to know *who* is asking, so verification is the
//! whole story here: no sessions, no refresh.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub is_guest: bool,
    /// Expiry, seconds since the epoch
    pub exp: usize,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Token lifetime out of range")]
    InvalidLifetime,
}

/// Keys and validation rules, built once at startup
#[derive(Clone)]
pub struct AuthConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Sign a token for `user_id` valid for `ttl`
    pub fn issue(&self, user_id: &str, email: &str, ttl: chrono::Duration) -> Result<String, AuthError> {
        let exp = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(AuthError::InvalidLifetime)?
            .timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            email: email.to_string(),
            is_guest: false,
            exp: usize::try_from(exp).map_err(|_| AuthError::InvalidLifetime)?,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Verify an `Authorization` header value of the form `Bearer <token>`
    pub fn verify_header(&self, header: &str) -> Option<Claims> {
        let token = header.strip_prefix("Bearer ")?.trim();
        match self.verify(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!("Ignoring bearer token: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let auth = AuthConfig::new("test-secret");
        let token = auth
            .issue("3f2b8c1e-0000-4000-8000-000000000001", "reader@example.com", chrono::Duration::hours(1))
            .unwrap();

        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.user_id, "3f2b8c1e-0000-4000-8000-000000000001");
        assert_eq!(claims.email, "reader@example.com");
        assert!(!claims.is_guest);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = AuthConfig::new("one")
            .issue("u1", "a@b.c", chrono::Duration::hours(1))
            .unwrap();
        assert!(AuthConfig::new("two").verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = AuthConfig::new("test-secret");
        let token = auth.issue("u1", "a@b.c", chrono::Duration::hours(-2)).unwrap();
        assert!(matches!(auth.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_verify_header() {
        let auth = AuthConfig::new("test-secret");
        let token = auth.issue("u1", "a@b.c", chrono::Duration::hours(1)).unwrap();

        assert_eq!(
            auth.verify_header(&format!("Bearer {}", token)).map(|c| c.user_id),
            Some("u1".to_string())
        );
        assert!(auth.verify_header(&token).is_none());
        assert!(auth.verify_header("Bearer garbage").is_none());
    }
}
