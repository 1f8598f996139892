use std::path::{Component, Path};

/// Longest filename accepted for storage
pub const MAX_FILENAME_LEN: usize = 255;

/// Extension table for the media and document types served for playback
const EXTENSION_CONTENT_TYPES: &[(&str, &str)] = &[
    // Video
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("ogv", "video/ogg"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
    ("ts", "video/mp2t"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("aac", "audio/aac"),
    // Images
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    // Documents
    ("pdf", "application/pdf"),
    ("txt", "text/plain; charset=utf-8"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("zip", "application/zip"),
];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Checks that a caller supplied name is a single leaf component.
///
/// Anything that could resolve outside the storage root is rejected rather
/// than rewritten: separators of either flavour, `.`/`..`, drive prefixes,
/// control characters and empty names.
pub fn validate_leaf_name(name: &str) -> Result<&str, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        });
    }

    if name.len() > MAX_FILENAME_LEN {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("Filename exceeds {} bytes", MAX_FILENAME_LEN),
        });
    }

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        tracing::warn!("Path traversal attempt detected: {:?}", name);
        return Err(ValidationError {
            code: "PATH_TRAVERSAL",
            message: "Filename must not contain path components".to_string(),
        });
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename contains control characters".to_string(),
        });
    }

    // Catches platform prefixes such as `C:` on Windows
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => {
            tracing::warn!("Path traversal attempt detected: {:?}", name);
            Err(ValidationError {
                code: "PATH_TRAVERSAL",
                message: "Filename must be a plain file name".to_string(),
            })
        }
    }
}

/// Content type derived from the file extension, if it is a known one
pub fn content_type_from_extension(name: &str) -> Option<&'static str> {
    let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
    EXTENSION_CONTENT_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, content_type)| *content_type)
}

/// Resolves the content type from the extension, falling back to the magic
/// bytes in `header` and finally to `application/octet-stream`
pub fn resolve_content_type(name: &str, header: &[u8]) -> String {
    if let Some(content_type) = content_type_from_extension(name) {
        return content_type.to_string();
    }

    match infer::get(header) {
        Some(kind) => kind.mime_type().to_string(),
        None => mime::APPLICATION_OCTET_STREAM.to_string(),
    }
}
