use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::dto::{ChangeEmailRequest, ChangeNameRequest, ChangePasswordRequest, UserResponse};
use crate::middleware::{ApiResponse, ApiResult, Identity};
use crate::state::AppState;

/// GET /api/users
pub async fn list(State(state): State<AppState>, _identity: Identity) -> ApiResult<Vec<UserResponse>> {
    Ok(ApiResponse::success(state.users.get_users().await?))
}

/// GET /api/users/me
pub async fn me(State(state): State<AppState>, identity: Identity) -> ApiResult<UserResponse> {
    Ok(ApiResponse::success(state.users.get_user(identity.user_id).await?))
}

/// PATCH /api/users/me/name - requires the current password
pub async fn change_name(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<ChangeNameRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(request) = payload?;
    state.users.change_name(identity.user_id, request).await?;
    Ok(ApiResponse::done())
}

/// PATCH /api/users/me/email - requires the current password
pub async fn change_email(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<ChangeEmailRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(request) = payload?;
    state.users.change_email(identity.user_id, request).await?;
    Ok(ApiResponse::done())
}

/// PATCH /api/users/me/password
pub async fn change_password(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(request) = payload?;
    state.users.change_password(identity.user_id, request).await?;
    Ok(ApiResponse::done())
}

/// DELETE /api/users/me
pub async fn delete(State(state): State<AppState>, identity: Identity) -> ApiResult<()> {
    state.users.delete_user(identity.user_id).await?;
    Ok(ApiResponse::done())
}
