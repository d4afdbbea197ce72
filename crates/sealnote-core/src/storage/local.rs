//! Single-file backend on the local filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::traits::StorageFormat;
use super::types::StoredBlob;
use crate::error::BackendError;

/// Stores the document in one file; the file's mtime is its timestamp.
#[derive(Debug, Clone)]
pub struct LocalFileBackend {
    name: String,
    path: PathBuf,
}

impl LocalFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "local".to_string(),
            path: path.into(),
        }
    }

    /// Same backend under a different report name.
    pub fn named(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StorageFormat for LocalFileBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<Option<StoredBlob>, BackendError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_file(&path))
            .await
            .map_err(|e| io::Error::other(format!("Read task failed: {}", e)))?
    }

    async fn write(&self, blob: &StoredBlob) -> Result<(), BackendError> {
        let path = self.path.clone();
        let bytes = blob.bytes.clone();
        let modified = SystemTime::from(blob.modified_time);
        tokio::task::spawn_blocking(move || crate::fs::write_atomic(&path, &bytes, modified))
            .await
            .map_err(|e| io::Error::other(format!("Write task failed: {}", e)))??;
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<Option<StoredBlob>, BackendError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let modified: DateTime<Utc> = fs::metadata(path)?.modified()?.into();
    Ok(Some(StoredBlob::new(bytes, modified)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_reads_as_absent() {
        let dir = tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path().join("sealnote.json"));
        assert!(backend.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read_keeps_timestamp() {
        let dir = tempdir().unwrap();
        let backend = LocalFileBackend::new(dir.path().join("sub").join("sealnote.json"));
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let blob = StoredBlob::new(b"{\"keys\":[]}".to_vec(), when);

        backend.write(&blob).await.unwrap();

        let read = backend.read().await.unwrap().unwrap();
        assert_eq!(read, blob);
    }

    #[tokio::test]
    async fn test_unreadable_path_is_an_error() {
        let dir = tempdir().unwrap();
        // A directory where the file should be.
        let backend = LocalFileBackend::new(dir.path());
        assert!(matches!(
            backend.read().await,
            Err(BackendError::Io { .. })
        ));
    }
}
