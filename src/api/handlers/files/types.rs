use crate::services::storage::FileEntry;
use crate::utils::validation::content_type_from_extension;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Form field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "file";

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    /// Location of the stored file, including the storage root
    pub path: String,
    pub filename: String,
    pub size: u64,
}

/// Multipart body accepted by `/upload`
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct FileDescriptor {
    pub name: String,
    pub size: u64,
    pub modified: Option<chrono::DateTime<Utc>>,
    pub content_type: String,
}

impl From<FileEntry> for FileDescriptor {
    fn from(entry: FileEntry) -> Self {
        let content_type = content_type_from_extension(&entry.name)
            .map(str::to_string)
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        Self {
            name: entry.name,
            size: entry.size,
            modified: entry.modified,
            content_type,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ListFilesResponse {
    pub page: u64,
    pub size: u64,
    pub total: usize,
    pub files: Vec<FileDescriptor>,
}

#[derive(Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFilesQuery {
    /// 1-based page number
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u64>,
    /// Entries per page
    #[validate(range(min = 1, max = 1000, message = "size must be between 1 and 1000"))]
    pub size: Option<u64>,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub filename: Option<String>,
}
