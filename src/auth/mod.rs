use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;

pub mod issuer;
pub mod password;
pub mod validator;

pub use issuer::{IssuedToken, TokenIssuer};
pub use validator::TokenValidator;

/// Claims carried by every access token.
///
/// The wire names (`userID`, `email`, `iat`, `exp`) are what clients and
/// other services already decode, so they stay fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userID")]
    pub user_id: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing material shared by the issuer and the validator.
///
/// Both are built from the same value at startup; a mismatch would make
/// every issued token fail validation.
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub ttl: Duration,
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.security.jwt_secret.clone(), config.jwt_ttl())
    }
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header required")]
    MissingCredential,

    #[error("invalid authorization format, expected 'Bearer <token>'")]
    MalformedCredential,

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token signing method: {0}")]
    UnsupportedSigningMethod(String),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("token is missing required claims")]
    IncompleteClaims,

    #[error("failed to issue token: {0}")]
    Issuance(String),
}

impl AuthError {
    /// Everything except issuance is a problem with what the caller presented
    pub fn is_credential_error(&self) -> bool {
        !matches!(self, AuthError::Issuance(_))
    }
}
