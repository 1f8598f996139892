use crate::utils::validation::validate_leaf_name;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncWriteExt};

/// Buffer size used when writing uploads to disk
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("upload exceeds limit of {0} bytes")]
    LimitExceeded(u64),

    /// The incoming byte source failed, as opposed to the disk
    #[error("source read failed: {0}")]
    Source(std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored file as seen on disk
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl FileEntry {
    fn from_metadata(name: &str, metadata: &std::fs::Metadata) -> Self {
        Self {
            name: name.to_string(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        }
    }
}

/// Readable, seekable handle returned by [`StorageService::open`]
pub trait FileReader: AsyncRead + AsyncSeek + Unpin + Send {}

impl<T: AsyncRead + AsyncSeek + Unpin + Send> FileReader for T {}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Directory every name is resolved against
    fn root(&self) -> &Path;

    /// Creates `name` exclusively and fills it from `reader`, writing at most
    /// `limit` bytes. Returns the number of bytes stored.
    async fn create_new<'a>(
        &self,
        name: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
        limit: u64,
    ) -> Result<u64, StorageError>;

    async fn stat(&self, name: &str) -> Result<FileEntry, StorageError>;

    /// Regular files directly under the root, ordered by name
    async fn list(&self) -> Result<Vec<FileEntry>, StorageError>;

    async fn remove(&self, name: &str) -> Result<(), StorageError>;

    async fn open(&self, name: &str) -> Result<(Box<dyn FileReader>, FileEntry), StorageError>;

    async fn is_available(&self) -> bool;
}

/// Storage backed by a single local directory
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins a validated leaf name onto the root
    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let name = validate_leaf_name(name).map_err(|e| StorageError::InvalidName(e.message))?;
        Ok(self.root.join(name))
    }

    async fn copy_limited<'a>(
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
        file: &mut File,
        limit: u64,
    ) -> Result<u64, StorageError> {
        let mut buffer = vec![0u8; UPLOAD_CHUNK_SIZE];
        let mut total: u64 = 0;

        loop {
            let n = reader.read(&mut buffer).await.map_err(StorageError::Source)?;
            if n == 0 {
                break;
            }

            total += n as u64;
            if total > limit {
                return Err(StorageError::LimitExceeded(limit));
            }

            file.write_all(&buffer[..n]).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(total)
    }
}

fn not_found_or_io(name: &str, err: std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(name.to_string())
    } else {
        StorageError::Io(err)
    }
}

#[async_trait]
impl StorageService for LocalStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn create_new<'a>(
        &self,
        name: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
        limit: u64,
    ) -> Result<u64, StorageError> {
        let path = self.resolve(name)?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(name.to_string()));
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        match Self::copy_limited(reader, &mut file, limit).await {
            Ok(written) => {
                tracing::debug!(file = %name, bytes = written, "stored upload");
                Ok(written)
            }
            Err(e) => {
                drop(file);
                if let Err(cleanup) = fs::remove_file(&path).await {
                    tracing::warn!(
                        file = %name,
                        error = %cleanup,
                        "Failed to remove partially written upload"
                    );
                }
                Err(e)
            }
        }
    }

    async fn stat(&self, name: &str) -> Result<FileEntry, StorageError> {
        let path = self.resolve(name)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))?;

        if !metadata.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        Ok(FileEntry::from_metadata(name, &metadata))
    }

    async fn list(&self) -> Result<Vec<FileEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;

        while let Some(entry) = dir.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!("Skipping non UTF-8 entry: {:?}", entry.file_name());
                continue;
            };

            // Entries can disappear between read_dir and metadata
            let metadata = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            if metadata.is_file() {
                entries.push(FileEntry::from_metadata(&name, &metadata));
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn remove(&self, name: &str) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))
    }

    async fn open(&self, name: &str) -> Result<(Box<dyn FileReader>, FileEntry), StorageError> {
        let path = self.resolve(name)?;
        let file = File::open(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))?;
        let metadata = file.metadata().await?;

        if !metadata.is_file() {
            return Err(StorageError::NotFound(name.to_string()));
        }

        Ok((Box::new(file), FileEntry::from_metadata(name, &metadata)))
    }

    async fn is_available(&self) -> bool {
        fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Yields some bytes then fails, like a client dropping mid-upload
    struct FailingReader {
        sent: bool,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                Poll::Ready(Err(io::Error::other("connection reset")))
            } else {
                self.sent = true;
                buf.put_slice(b"partial");
                Poll::Ready(Ok(()))
            }
        }
    }

    #[tokio::test]
    async fn test_create_new_and_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let written = storage
            .create_new("a.txt", Box::new(&b"hello"[..]), 1024)
            .await
            .unwrap();
        assert_eq!(written, 5);

        let err = storage
            .create_new("a.txt", Box::new(&b"other"[..]), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_create_new_over_limit_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let data = vec![7u8; 100];
        let err = storage
            .create_new("big.bin", Box::new(&data[..]), 99)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::LimitExceeded(99)));
        assert!(!dir.path().join("big.bin").exists());

        // Exactly at the limit is fine
        storage
            .create_new("big.bin", Box::new(&data[..]), 100)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_new_source_failure_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage
            .create_new("broken.txt", Box::new(FailingReader { sent: false }), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Source(_)));
        assert!(!dir.path().join("broken.txt").exists());
    }

    #[tokio::test]
    async fn test_list_sorted_and_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let storage = LocalStorage::new(dir.path());
        let entries = storage.list().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        assert_eq!(entries[1].size, 2);
        assert!(entries[0].modified.is_some());
    }

    #[tokio::test]
    async fn test_stat_remove_and_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), b"xyz").unwrap();
        std::fs::create_dir(dir.path().join("folder")).unwrap();
        let storage = LocalStorage::new(dir.path());

        assert_eq!(storage.stat("x.txt").await.unwrap().size, 3);
        assert!(matches!(
            storage.stat("folder").await,
            Err(StorageError::NotFound(_))
        ));

        let (mut reader, entry) = storage.open("x.txt").await.unwrap();
        let mut contents = Vec::new();
        reader.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"xyz");
        assert_eq!(entry.name, "x.txt");

        storage.remove("x.txt").await.unwrap();
        assert!(matches!(
            storage.remove("x.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_names_are_confined_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(matches!(
            storage.stat("../outside.txt").await,
            Err(StorageError::InvalidName(_))
        ));
        assert!(matches!(
            storage
                .create_new("../escape.txt", Box::new(&b"x"[..]), 10)
                .await,
            Err(StorageError::InvalidName(_))
        ));
        assert!(storage.is_available().await);
    }
}
