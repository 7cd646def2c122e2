// handlers/protected/upload.rs - POST /upload handler

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Extension,
};
use bytes::BytesMut;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::upload::{FileBlob, UploadError, UploadValidator, FIELD_NAME};

/// POST /upload - Store up to four photos and return their URLs
///
/// Expects `multipart/form-data` with every file under the `photos` field.
/// Text fields are ignored; a file under any other field name is rejected.
/// The batch is validated as a whole before the first byte is stored.
///
/// ```json
/// { "success": true, "message": "Files uploaded successfully", "files": ["https://..."] }
/// ```
pub async fn upload_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Value> {
    let multipart =
        multipart.map_err(|rejection| UploadError::Malformed(rejection.body_text()))?;
    let files = read_files(multipart, state.uploads.validator()).await?;

    let stored = state.uploads.upload_batch(files).await?;
    let urls: Vec<String> = stored.into_iter().map(|object| object.url).collect();

    tracing::info!(usuario_id = %auth.id, count = urls.len(), "Photos uploaded");
    Ok(ApiResponse::created(json!({ "files": urls })).with_message("Files uploaded successfully"))
}

/// Collect file parts, enforcing the count and size limits while streaming.
/// After the first rejection the rest of the body is drained, not buffered.
async fn read_files(
    mut multipart: Multipart,
    validator: &UploadValidator,
) -> Result<Vec<FileBlob>, ApiError> {
    let max_files = validator.limits().max_files;
    let mut files = Vec::new();
    let mut rejection: Option<UploadError> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if rejection.is_some() {
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_string) else {
            // plain text field
            continue;
        };

        let field_name = field.name().unwrap_or_default().to_string();
        if field_name != FIELD_NAME {
            rejection = Some(UploadError::UnexpectedField(field_name));
            continue;
        }
        if files.len() == max_files {
            rejection = Some(UploadError::TooManyFiles { max: max_files });
            continue;
        }

        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let mut content = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            content.extend_from_slice(&chunk);
            if let Err(e) = validator.check_size(&original_name, content.len() as u64) {
                rejection = Some(e);
                break;
            }
        }
        if rejection.is_none() {
            files.push(FileBlob::new(original_name, mime_type, content.freeze()));
        }
    }

    match rejection {
        Some(e) => Err(e.into()),
        None => Ok(files),
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::bad_request("Request body exceeds the upload size limit");
    }
    UploadError::Malformed(err.body_text()).into()
}
