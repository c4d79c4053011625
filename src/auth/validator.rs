use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{AuthError, Claims, JwtSettings};

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Claims as they arrive on the wire, before completeness is checked.
///
/// `iat` and `exp` are NumericDates, which may carry a fractional part;
/// they are truncated to whole seconds.
#[derive(Deserialize)]
struct RawClaims {
    #[serde(rename = "userID")]
    user_id: Option<Value>,
    email: Option<Value>,
    iat: Option<f64>,
    exp: Option<f64>,
}

pub struct TokenValidator {
    decoding_key: DecodingKey,
    has_secret: bool,
}

impl TokenValidator {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            has_secret: !settings.secret.is_empty(),
        }
    }

    /// Verify structure, algorithm family, signature and expiry, then
    /// extract a complete identity.
    ///
    /// The algorithm is checked before the signature so a token signed with
    /// anything other than HMAC surfaces as `UnsupportedSigningMethod`
    /// rather than a generic signature failure.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let algorithm = hmac_algorithm(&read_alg(token)?)?;

        if !self.has_secret {
            return Err(AuthError::InvalidSignature);
        }

        // Expiry is checked below so fractional NumericDates are honoured
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<RawClaims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::MissingRequiredClaim(_) => AuthError::IncompleteClaims,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                AuthError::UnsupportedSigningMethod(format!("{:?}", algorithm))
            }
            _ => AuthError::MalformedToken,
        })?;

        let exp = data.claims.exp.ok_or(AuthError::IncompleteClaims)?;
        if exp < Utc::now().timestamp() as f64 {
            return Err(AuthError::Expired);
        }

        complete_claims(data.claims)
    }
}

fn read_alg(token: &str) -> Result<String, AuthError> {
    let mut segments = token.split('.');
    let (header, _payload, _signature) = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() => (h, p, s),
        _ => return Err(AuthError::MalformedToken),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedToken)?;
    let header: RawHeader = serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;
    Ok(header.alg)
}

fn hmac_algorithm(alg: &str) -> Result<Algorithm, AuthError> {
    match alg {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(AuthError::UnsupportedSigningMethod(other.to_string())),
    }
}

fn complete_claims(raw: RawClaims) -> Result<Claims, AuthError> {
    let user_id = raw
        .user_id
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .filter(|id| !id.is_nil())
        .ok_or(AuthError::IncompleteClaims)?;

    let email = raw
        .email
        .as_ref()
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or(AuthError::IncompleteClaims)?
        .to_string();

    Ok(Claims {
        user_id,
        email,
        iat: raw.iat.map(|iat| iat as i64).unwrap_or_default(),
        exp: raw.exp.map(|exp| exp as i64).ok_or(AuthError::IncompleteClaims)?,
    })
}
