use crate::AppState;
use crate::api::error::AppError;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use validator::Validate;

use super::types::*;

#[utoipa::path(
    get,
    path = "/list",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "One page of stored files", body = ListFilesResponse),
        (status = 400, description = "Invalid page or size", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<AppState>,
    query: Result<Query<ListFilesQuery>, QueryRejection>,
) -> Result<Json<ListFilesResponse>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    query
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let page = query.page.unwrap_or(state.config.default_page);
    let size = query.size.unwrap_or(state.config.default_size);

    let entries = state.storage.list().await?;
    let total = entries.len();

    let skip = usize::try_from(page.saturating_sub(1).saturating_mul(size)).unwrap_or(usize::MAX);
    let take = usize::try_from(size).unwrap_or(usize::MAX);

    let files: Vec<FileDescriptor> = entries
        .into_iter()
        .skip(skip)
        .take(take)
        .map(FileDescriptor::from)
        .collect();

    tracing::debug!(page, size, total, returned = files.len(), "Listed files");

    Ok(Json(ListFilesResponse {
        page,
        size,
        total,
        files,
    }))
}
