//! Synchronization engine.
//!
//! Reads fan out to every backend at once. The newest blob wins (ties go to
//! the backend listed first), every backend that answered with different
//! bytes is rewritten with it, and the winner is decoded. Backends that
//! failed to read are left alone since their content is unknown.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::traits::StorageFormat;
use super::types::{ReadOutcome, ReadReport, StoredBlob, WriteReport};
use crate::error::{BackendError, BackendFailure, StorageError};
use crate::message::Message;

/// Backends in priority order, index 0 highest.
#[derive(Clone)]
pub struct Storage {
    backends: Vec<Arc<dyn StorageFormat>>,
}

impl Storage {
    pub fn new(backends: Vec<Arc<dyn StorageFormat>>) -> Self {
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends
            .iter()
            .map(|backend| backend.name().to_string())
            .collect()
    }

    pub async fn read(&self) -> Result<ReadReport, StorageError> {
        let results = join_all(self.backends.iter().map(|backend| read_logged(backend.as_ref()))).await;

        let mut failures = Vec::new();
        let mut answered: Vec<(usize, Option<StoredBlob>)> = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(blob) => answered.push((index, blob)),
                Err(error) => failures.push(self.failure(index, error)),
            }
        }

        if answered.is_empty() && !self.backends.is_empty() {
            return Err(StorageError::AllBackendsFailed(failures));
        }

        let Some(authoritative) = newest(&answered) else {
            if failures.is_empty() {
                return Ok(ReadReport {
                    outcome: ReadOutcome::Empty,
                    failures,
                    repaired: Vec::new(),
                });
            }
            return Err(StorageError::Inconclusive(failures));
        };

        let stale: Vec<usize> = answered
            .iter()
            .filter(|(_, blob)| blob.as_ref().map(|b| &b.bytes) != Some(&authoritative.bytes))
            .map(|(index, _)| *index)
            .collect();

        let repairs = join_all(
            stale
                .iter()
                .map(|index| write_logged(self.backends[*index].as_ref(), &authoritative)),
        )
        .await;

        let mut repaired = Vec::new();
        for (index, result) in stale.into_iter().zip(repairs) {
            match result {
                Ok(()) => {
                    info!(backend = self.backends[index].name(), "Repaired stale backend");
                    repaired.push(self.backends[index].name().to_string());
                }
                Err(error) => failures.push(self.failure(index, error)),
            }
        }

        let message = Message::decode(&authoritative.bytes)?;
        Ok(ReadReport {
            outcome: ReadOutcome::Found(message),
            failures,
            repaired,
        })
    }

    /// Write `message` to every backend with the current time.
    pub async fn write(&self, message: &Message) -> Result<WriteReport, StorageError> {
        let blob = StoredBlob::new(message.encode()?, Utc::now());
        let results = join_all(
            self.backends
                .iter()
                .map(|backend| write_logged(backend.as_ref(), &blob)),
        )
        .await;

        let mut written = Vec::new();
        let mut failures = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(()) => written.push(self.backends[index].name().to_string()),
                Err(error) => failures.push(self.failure(index, error)),
            }
        }

        if written.is_empty() && !failures.is_empty() {
            return Err(StorageError::AllBackendsFailed(failures));
        }
        info!(backends = ?written, "Wrote document");
        Ok(WriteReport { written, failures })
    }

    fn failure(&self, index: usize, error: BackendError) -> BackendFailure {
        BackendFailure {
            backend: self.backends[index].name().to_string(),
            error,
        }
    }
}

/// Newest blob among answered backends; the earliest index wins ties.
fn newest(answered: &[(usize, Option<StoredBlob>)]) -> Option<StoredBlob> {
    let mut best: Option<&StoredBlob> = None;
    for blob in answered.iter().filter_map(|(_, blob)| blob.as_ref()) {
        match best {
            Some(current) if current.modified_time >= blob.modified_time => {}
            _ => best = Some(blob),
        }
    }
    best.cloned()
}

async fn read_logged(backend: &dyn StorageFormat) -> Result<Option<StoredBlob>, BackendError> {
    debug!(backend = backend.name(), "read start");
    let result = backend.read().await;
    match &result {
        Ok(blob) => debug!(backend = backend.name(), found = blob.is_some(), "read end"),
        Err(e) => warn!(backend = backend.name(), error = %e, "read failed"),
    }
    result
}

async fn write_logged(backend: &dyn StorageFormat, blob: &StoredBlob) -> Result<(), BackendError> {
    debug!(backend = backend.name(), "write start");
    let result = backend.write(blob).await;
    match &result {
        Ok(()) => debug!(backend = backend.name(), "write end"),
        Err(e) => warn!(backend = backend.name(), error = %e, "write failed"),
    }
    result
}
