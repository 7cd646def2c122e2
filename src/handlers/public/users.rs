// handlers/public/users.rs - /users collection and /users/:id records

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::UserInput;
use crate::error::ApiError;
use crate::handlers::{json_body, path_id};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /users - Create a health-metrics profile
pub async fn user_post(
    State(state): State<AppState>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> ApiResult<Value> {
    let new_user = json_body(payload)?.into_new_user()?;
    let user = state.store.create_user(new_user).await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(ApiResponse::created(json!({ "user": user })).with_message("User created successfully"))
}

/// GET /users - All profiles, newest first
pub async fn users_get(State(state): State<AppState>) -> ApiResult<Value> {
    let users = state.store.list_users().await?;
    Ok(ApiResponse::success(json!({ "users": users })))
}

/// GET /users/:id
pub async fn user_get(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    let user = state.store.get_user(path_id(id)?).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// PUT /users/:id - Partial update; provided fields follow the create rules
pub async fn user_put(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> ApiResult<Value> {
    let id = path_id(id)?;
    let changes = json_body(payload)?.into_changes()?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let user = state.store.update_user(id, changes).await?;
    tracing::info!(user_id = %user.id, "User updated");
    Ok(ApiResponse::success(json!({ "user": user })).with_message("User updated successfully"))
}

/// DELETE /users/:id
pub async fn user_delete(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    let id = path_id(id)?;
    state.store.delete_user(id).await?;

    tracing::info!(user_id = %id, "User deleted");
    Ok(ApiResponse::message("User deleted successfully"))
}
