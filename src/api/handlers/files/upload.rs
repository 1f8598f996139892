use crate::AppState;
use crate::api::error::AppError;
use crate::utils::validation::validate_leaf_name;
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{HeaderMap, StatusCode, header},
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::types::*;

/// Allowance on top of the upload limit for multipart boundaries and part headers
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::BadRequest("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing, malformed or oversized body", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 409, description = "File already exists", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let max_upload_size = state.config.max_upload_size;

    // Refuse early when the client already admits the body is too large
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > max_upload_size.saturating_add(MULTIPART_OVERHEAD)) {
        tracing::warn!(
            declared = ?declared,
            limit = max_upload_size,
            "Rejecting upload with oversized Content-Length"
        );
        return Err(AppError::BadRequest(format!(
            "Upload exceeds the maximum allowed size of {} bytes",
            max_upload_size
        )));
    }

    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let result: Result<(String, u64), AppError> = async {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some(UPLOAD_FIELD) {
                continue;
            }

            let original_filename = field
                .file_name()
                .ok_or_else(|| AppError::BadRequest("File part has no filename".to_string()))?
                .to_string();
            let filename = validate_leaf_name(&original_filename)
                .map_err(|e| AppError::BadRequest(e.message))?
                .to_string();

            let reader = StreamReader::new(Box::pin(field.map_err(std::io::Error::other)));
            let size = state
                .storage
                .create_new(&filename, Box::new(reader), max_upload_size as u64)
                .await?;

            return Ok((filename, size));
        }

        Err(AppError::BadRequest("No file provided".to_string()))
    }
    .await;

    match result {
        Ok((filename, size)) => {
            let path = state.storage.root().join(&filename);
            tracing::info!(file = %filename, bytes = size, "File uploaded");

            Ok((
                StatusCode::CREATED,
                Json(UploadResponse {
                    path: path.display().to_string(),
                    filename,
                    size,
                }),
            ))
        }
        Err(e) => {
            // Consume what is left of the body so the client sees the response instead of a reset
            tracing::warn!("Upload failed early: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}
