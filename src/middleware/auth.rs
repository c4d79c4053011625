use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::auth::{AuthError, Claims, TokenValidator};
use crate::error::ApiError;
use crate::state::AppState;

/// The caller behind a request, re-derived from its token every time
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

/// Resolve the `Authorization` header into an identity.
///
/// The header must be exactly `Bearer <token>`; anything else is rejected
/// before the token is looked at.
pub fn authenticate(headers: &HeaderMap, validator: &TokenValidator) -> Result<Identity, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingCredential)?;
    let value = header.to_str().map_err(|_| AuthError::MalformedCredential)?;

    let parts: Vec<&str> = value.split(' ').collect();
    let token = match parts.as_slice() {
        ["Bearer", token] => *token,
        _ => return Err(AuthError::MalformedCredential),
    };

    validator.validate(token).map(Identity::from)
}

/// Middleware guarding every protected route
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = authenticate(request.headers(), &state.validator).map_err(|e| {
        debug!(reason = %e, path = %request.uri().path(), "rejected request");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| ApiError::from(AuthError::MissingCredential))
    }
}
