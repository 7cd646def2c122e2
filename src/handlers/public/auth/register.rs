// handlers/public/auth/register.rs - POST /auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use crate::database::models::{NewAccount, RegisterInput, DEFAULT_ROLE};
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/register - Create a login account
///
/// Expects `{name, email, password}`; the password is stored only as a
/// bcrypt hash. A second registration with the same email is a 409.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> ApiResult<Value> {
    let registration = json_body(payload)?.validate()?;
    let password_hash = state.passwords.hash(&registration.password).await?;

    let account = state
        .store
        .create_account(NewAccount {
            name: registration.name,
            email: registration.email,
            password_hash,
            role: DEFAULT_ROLE.to_string(),
        })
        .await?;

    tracing::info!(account_id = %account.id, "Account registered");
    Ok(ApiResponse::created(json!({ "user": account })).with_message("Account registered"))
}
