use anyhow::{Result, bail};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Largest page size a listing request may ask for.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Runtime configuration for the file server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum accepted upload size in bytes (default: 10 MB)
    pub max_upload_size: usize,

    /// Chunk size used when streaming files to clients (default: 1 KB)
    pub max_stream_buffer: usize,

    /// Page returned by /list when none is requested (default: 1)
    pub default_page: u64,

    /// Page size used by /list when none is requested (default: 10)
    pub default_size: u64,

    /// Directory holding every managed file (default: "./uploads")
    pub storage_root: PathBuf,

    /// Listen address (default: "127.0.0.1:8080")
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_size: 10 * 1024 * 1024, // 10 MB
            max_stream_buffer: 1024,
            default_page: 1,
            default_size: 10,
            storage_root: PathBuf::from("./uploads"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from `lookup`, keeping the default for any key that
    /// is missing or does not parse
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            max_upload_size: lookup("MAX_UPLOAD_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            max_stream_buffer: lookup("MAX_STREAM_BUFFER")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_stream_buffer),

            default_page: lookup("DEFAULT_PAGE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.default_page),

            default_size: lookup("DEFAULT_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.default_size),

            storage_root: lookup("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.storage_root),

            bind_addr: lookup("BIND_ADDR")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.bind_addr),
        }
    }

    /// Create config for tests rooted at the given directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: root.into(),
            ..Self::default()
        }
    }

    /// Rejects values the handlers cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_upload_size == 0 {
            bail!("MAX_UPLOAD_SIZE must be greater than zero");
        }
        if self.max_stream_buffer == 0 {
            bail!("MAX_STREAM_BUFFER must be greater than zero");
        }
        if self.default_page == 0 {
            bail!("DEFAULT_PAGE must be at least 1");
        }
        if self.default_size == 0 || self.default_size > MAX_PAGE_SIZE {
            bail!("DEFAULT_SIZE must be between 1 and {}", MAX_PAGE_SIZE);
        }
        if self.storage_root.as_os_str().is_empty() {
            bail!("STORAGE_ROOT must not be empty");
        }
        Ok(())
    }
}
