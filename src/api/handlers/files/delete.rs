use crate::AppState;
use crate::api::error::AppError;
use crate::utils::validation::validate_leaf_name;
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};

use super::types::*;

#[utoipa::path(
    delete,
    path = "/delete",
    params(
        ("filename" = String, Query, description = "Name of the file to remove")
    ),
    responses(
        (status = 204, description = "File removed"),
        (status = 400, description = "Filename missing or invalid", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 500, description = "Removal failed", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let filename = query
        .filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| AppError::BadRequest("Filename not provided".to_string()))?;
    validate_leaf_name(&filename).map_err(|e| AppError::BadRequest(e.message))?;

    state.storage.stat(&filename).await?;
    state.storage.remove(&filename).await?;

    tracing::info!(file = %filename, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}
