//! Backend trait definitions.
//!
//! A `StorageFormat` is one independent place a document can live: a local
//! file, a cloud drive file. The synchronization engine treats them all the
//! same way and never assumes their clocks or availability agree.

use async_trait::async_trait;
use secrecy::SecretString;

use super::types::StoredBlob;
use crate::error::BackendError;

/// A byte store holding at most one document.
///
/// Implementations must ensure:
/// - `read` returns `Ok(None)` when no document exists, never an error
/// - `write` replaces the whole document and records `modified_time`
/// - a later `read` returns the written bytes unchanged
#[async_trait]
pub trait StorageFormat: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    async fn read(&self) -> Result<Option<StoredBlob>, BackendError>;

    async fn write(&self, blob: &StoredBlob) -> Result<(), BackendError>;
}

/// Source of OAuth bearer tokens for remote backends.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<SecretString, BackendError>;
}
