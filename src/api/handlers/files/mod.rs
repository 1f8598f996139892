pub mod delete;
pub mod list;
pub mod stream;
pub mod types;
pub mod upload;

// Re-export all types
pub use types::*;

// Re-export all handlers
pub use delete::delete_file;
pub use list::list_files;
pub use stream::stream_file;
pub use upload::{MULTIPART_OVERHEAD, upload_file};
