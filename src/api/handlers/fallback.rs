use crate::api::error::AppError;
use axum::http::Uri;

/// Answers requests whose route exists but whose method does not
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
