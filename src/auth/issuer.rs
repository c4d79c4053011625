use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::time::Duration;
use uuid::Uuid;

use super::{AuthError, Claims, JwtSettings};

/// A freshly signed token and the instant it stops being accepted
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    has_secret: bool,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            has_secret: !settings.secret.is_empty(),
            ttl: settings.ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(user_id, email, Utc::now())
    }

    pub fn issue_at(&self, user_id: Uuid, email: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        if !self.has_secret {
            return Err(AuthError::Issuance("signing secret is not configured".to_string()));
        }
        if user_id.is_nil() {
            return Err(AuthError::Issuance("user id must not be nil".to_string()));
        }
        if email.trim().is_empty() {
            return Err(AuthError::Issuance("email must not be empty".to_string()));
        }

        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| AuthError::Issuance(format!("invalid token lifetime: {}", e)))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Issuance("token lifetime overflows the clock".to_string()))?;

        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Issuance(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }
}
