pub mod api;
pub mod config;
pub mod services;
pub mod utils;

use crate::api::handlers::fallback::{method_not_allowed, not_found};
use crate::config::ServerConfig;
use crate::services::storage::{LocalStorage, StorageService};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::files::upload::upload_file,
        api::handlers::files::list::list_files,
        api::handlers::files::delete::delete_file,
        api::handlers::files::stream::stream_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::files::UploadResponse,
            api::handlers::files::UploadForm,
            api::handlers::files::FileDescriptor,
            api::handlers::files::ListFilesResponse,
            api::handlers::health::HealthResponse,
            api::error::ErrorResponse,
        )
    ),
    tags(
        (name = "files", description = "File management endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub config: ServerConfig,
}

impl AppState {
    /// State backed by a local directory at `config.storage_root`
    pub fn new(config: ServerConfig) -> Self {
        let storage = Arc::new(LocalStorage::new(config.storage_root.clone()));
        Self { storage, config }
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_app(state: AppState) -> Router {
    let upload_limit = state
        .config
        .max_upload_size
        .saturating_add(api::handlers::files::MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(api::handlers::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route(
            "/upload",
            post(api::handlers::files::upload_file)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/list",
            get(api::handlers::files::list_files).fallback(method_not_allowed),
        )
        .route(
            "/delete",
            delete(api::handlers::files::delete_file).fallback(method_not_allowed),
        )
        .route(
            "/stream/:name",
            get(api::handlers::files::stream_file).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
