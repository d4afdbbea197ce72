//! Values exchanged between the synchronization engine and its backends.

use chrono::{DateTime, Utc};

use crate::error::BackendFailure;
use crate::message::Message;

/// Encoded message bytes with the backend's notion of when they were written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub modified_time: DateTime<Utc>,
}

impl StoredBlob {
    pub fn new(bytes: Vec<u8>, modified_time: DateTime<Utc>) -> Self {
        Self {
            bytes,
            modified_time,
        }
    }
}

/// What a read found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Every backend answered and none holds a document.
    Empty,
    /// The newest document across backends.
    Found(Message),
}

#[derive(Debug)]
pub struct ReadReport {
    pub outcome: ReadOutcome,
    /// Backends that failed to read or to be repaired.
    pub failures: Vec<BackendFailure>,
    /// Backends rewritten with the authoritative blob.
    pub repaired: Vec<String>,
}

impl ReadReport {
    pub fn message(&self) -> Option<&Message> {
        match &self.outcome {
            ReadOutcome::Found(message) => Some(message),
            ReadOutcome::Empty => None,
        }
    }

    pub fn into_message(self) -> Option<Message> {
        match self.outcome {
            ReadOutcome::Found(message) => Some(message),
            ReadOutcome::Empty => None,
        }
    }
}

#[derive(Debug)]
pub struct WriteReport {
    pub written: Vec<String>,
    pub failures: Vec<BackendFailure>,
}
