// handlers/mod.rs - Two security tiers
//
// Public (no auth): banner, health, /auth/*, /users
// Protected (bearer JWT): /activaciones, /upload

pub mod protected;
pub mod public;

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Json, Path,
};
use uuid::Uuid;

use crate::error::ApiError;

/// Unwrap a JSON body, turning extractor rejections into `INVALID_JSON`
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))
}

/// Malformed ids are a client error, not a lookup miss
pub(crate) fn path_id(id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Invalid id format"))
}
