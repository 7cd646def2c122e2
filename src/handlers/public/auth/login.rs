// handlers/public/auth/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::database::models::LoginInput;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /auth/login - Exchange email and password for a session token
///
/// Success body:
/// ```json
/// {
///   "success": true,
///   "message": "Login successful",
///   "token": "eyJhbGciOiJIUzI1NiI...",
///   "expires_in": 7200,
///   "user": { "id": "...", "email": "...", "role": "user" }
/// }
/// ```
///
/// Unknown email and wrong password give the same 401 so the endpoint does
/// not reveal which accounts exist.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult<Value> {
    let (email, password) = json_body(payload)?.validate()?;

    let Some(account) = state.store.find_account_by_email(&email).await? else {
        tracing::warn!(email = %email, "Login attempt for unknown account");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !state.passwords.verify(&password, &account.password_hash).await? {
        tracing::warn!(account_id = %account.id, "Login attempt with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let issued = state
        .tokens
        .issue(account.id, &account.email, Some(&account.role))?;

    tracing::info!(account_id = %account.id, "Login successful");
    Ok(ApiResponse::success(json!({
        "token": issued.token,
        "expires_in": issued.expires_in,
        "user": {
            "id": account.id,
            "email": account.email,
            "role": account.role,
        }
    }))
    .with_message("Login successful"))
}
