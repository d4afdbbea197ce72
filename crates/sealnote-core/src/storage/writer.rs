//! Debounced single-writer queue in front of [`Storage`].
//!
//! Edits arrive faster than backends can absorb them. `schedule` keeps only
//! the latest message while its delay runs; once the delay elapses the write
//! waits its turn on a FIFO commit lock and leaves the pending slot only once
//! it holds that lock. A write that has left the pending slot can no longer
//! be cancelled, so a commit is never cut off halfway.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::engine::Storage;
use super::types::WriteReport;
use crate::error::StorageError;
use crate::message::Message;

pub struct WriteQueue {
    storage: Storage,
    delay: Duration,
    state: Arc<Mutex<QueueState>>,
    commit_lock: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Default)]
struct QueueState {
    generation: u64,
    pending: Option<Pending>,
}

struct Pending {
    generation: u64,
    message: Message,
    task: JoinHandle<()>,
}

impl WriteQueue {
    pub fn new(storage: Storage, delay: Duration) -> Self {
        Self {
            storage,
            delay,
            state: Arc::new(Mutex::new(QueueState::default())),
            commit_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Queue `message`, superseding a pending write whose delay has not
    /// elapsed. Must be called within a Tokio runtime.
    pub fn schedule(&self, message: Message) {
        let mut state = lock(&self.state);
        if let Some(previous) = state.pending.take() {
            previous.task.abort();
            debug!(generation = previous.generation, "Superseded pending write");
        }
        state.generation += 1;
        let generation = state.generation;

        let task = tokio::spawn(commit_after_delay(
            self.storage.clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.commit_lock),
            self.delay,
            generation,
        ));
        state.pending = Some(Pending {
            generation,
            message,
            task,
        });
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Commit the pending write now, after any in-flight commit.
    ///
    /// Returns `None` when nothing was pending.
    pub async fn flush(&self) -> Result<Option<WriteReport>, StorageError> {
        let pending = lock(&self.state).pending.take();
        let Some(pending) = pending else {
            self.idle().await;
            return Ok(None);
        };
        pending.task.abort();

        let _guard = self.commit_lock.lock().await;
        self.storage.write(&pending.message).await.map(Some)
    }

    /// Wait until no write is committing.
    pub async fn idle(&self) {
        drop(self.commit_lock.lock().await);
    }
}

async fn commit_after_delay(
    storage: Storage,
    state: Arc<Mutex<QueueState>>,
    commit_lock: Arc<tokio::sync::Mutex<()>>,
    delay: Duration,
    generation: u64,
) {
    tokio::time::sleep(delay).await;

    // Take the message only while holding the commit lock so a flush cannot
    // commit a newer message ahead of this one.
    let _guard = commit_lock.lock().await;
    let message = {
        let mut state = lock(&state);
        match state.pending.take() {
            Some(pending) if pending.generation == generation => pending.message,
            other => {
                state.pending = other;
                return;
            }
        }
    };

    match storage.write(&message).await {
        Ok(report) => {
            for failure in &report.failures {
                warn!(backend = %failure.backend, error = %failure.error, "Background write failed on backend");
            }
        }
        Err(e) => warn!(error = %e, "Background write failed"),
    }
}

fn lock(state: &Mutex<QueueState>) -> MutexGuard<'_, QueueState> {
    state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
