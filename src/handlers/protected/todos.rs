use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::dto::{ChangeContentRequest, ChangeStatusRequest, CreateTodoRequest, TodoResponse};
use crate::middleware::{ApiResponse, ApiResult, Identity};
use crate::state::AppState;

/// POST /api/todos
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> ApiResult<TodoResponse> {
    let Json(request) = payload?;
    let todo = state.todos.create_todo(&identity, request).await?;
    Ok(ApiResponse::created(todo))
}

/// GET /api/todos - the caller's todos, oldest first
pub async fn list(State(state): State<AppState>, identity: Identity) -> ApiResult<Vec<TodoResponse>> {
    Ok(ApiResponse::success(state.todos.get_todos(&identity).await?))
}

/// GET /api/todos/:todo_id
pub async fn show(
    State(state): State<AppState>,
    identity: Identity,
    todo_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<TodoResponse> {
    let Path(todo_id) = todo_id?;
    Ok(ApiResponse::success(state.todos.get_todo(&identity, todo_id).await?))
}

/// PATCH /api/todos/:todo_id/content
pub async fn change_content(
    State(state): State<AppState>,
    identity: Identity,
    todo_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ChangeContentRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Path(todo_id) = todo_id?;
    let Json(request) = payload?;
    state.todos.change_content(&identity, todo_id, request).await?;
    Ok(ApiResponse::done())
}

/// PATCH /api/todos/:todo_id/status
pub async fn change_status(
    State(state): State<AppState>,
    identity: Identity,
    todo_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Path(todo_id) = todo_id?;
    let Json(request) = payload?;
    state.todos.change_status(&identity, todo_id, request).await?;
    Ok(ApiResponse::done())
}

/// DELETE /api/todos/:todo_id
pub async fn delete(
    State(state): State<AppState>,
    identity: Identity,
    todo_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(todo_id) = todo_id?;
    state.todos.delete_todo(&identity, todo_id).await?;
    Ok(ApiResponse::done())
}
