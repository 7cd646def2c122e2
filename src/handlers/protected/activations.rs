// handlers/protected/activations.rs - /activaciones for the authenticated account

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::ActivationInput;
use crate::handlers::{json_body, path_id};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

/// POST /activaciones - Record a field visit, owned by the caller
///
/// Validation runs before any write. A second record with the same
/// `(cedula_identidad, fecha, lugar_activacion)` is a 409.
pub async fn activation_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<ActivationInput>, JsonRejection>,
) -> ApiResult<Value> {
    let new_activation = json_body(payload)?.validate(auth.id)?;
    let activation = state.store.create_activation(new_activation).await?;

    tracing::info!(
        activation_id = %activation.id,
        usuario_id = %auth.id,
        "Activation registered"
    );
    Ok(ApiResponse::created(json!({ "activacion": activation }))
        .with_message("Activation registered successfully"))
}

/// GET /activaciones - The caller's activations, newest first
pub async fn activations_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Value> {
    let activations = state.store.list_activations(auth.id).await?;
    Ok(ApiResponse::success(json!({ "activaciones": activations })))
}

/// GET /activaciones/:id - One of the caller's activations
pub async fn activation_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    let activation = state.store.get_activation(auth.id, path_id(id)?).await?;
    Ok(ApiResponse::success(json!({ "activacion": activation })))
}
