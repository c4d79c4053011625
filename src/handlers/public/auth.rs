use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/sign-up - create an account
///
/// Body: `{"name", "email", "password"}`. Responds 201 with the new user.
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<UserResponse> {
    let Json(request) = payload?;
    let user = state.auth.register(request).await?;
    Ok(ApiResponse::created(user))
}

/// POST /auth/sign-in - exchange email and password for a bearer token
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<AuthResponse> {
    let Json(request) = payload?;
    let response = state.auth.login(request).await?;
    Ok(ApiResponse::success(response))
}
