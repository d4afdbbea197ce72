//! Application controller for one document.
//!
//! Ties the synchronization engine, the write queue and the remembered
//! session together. While the front end is active the session is held
//! without a countdown; `pause` flushes writes and starts the countdown,
//! `resume` cancels it.

use std::time::Duration;

use crate::crypto::PassphraseKdf;
use crate::decrypted::DecryptedMessage;
use crate::error::{Result, StorageError};
use crate::session::SessionSlot;
use crate::storage::{ReadReport, Storage, WriteQueue, WriteReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultOptions {
    /// How long a paused session stays unlocked. `None` never expires.
    pub remember_timeout: Option<Duration>,
    /// Debounce delay for scheduled writes.
    pub write_debounce: Duration,
}

impl Default for VaultOptions {
    fn default() -> Self {
        Self {
            remember_timeout: Some(Duration::from_secs(300)),
            write_debounce: Duration::ZERO,
        }
    }
}

pub struct Vault {
    writer: WriteQueue,
    slot: SessionSlot,
    remember_timeout: Option<Duration>,
}

impl Vault {
    pub fn new(storage: Storage, slot: SessionSlot, options: VaultOptions) -> Self {
        Self {
            writer: WriteQueue::new(storage, options.write_debounce),
            slot,
            remember_timeout: options.remember_timeout,
        }
    }

    pub fn storage(&self) -> &Storage {
        self.writer.storage()
    }

    pub fn slot(&self) -> &SessionSlot {
        &self.slot
    }

    /// Read and reconcile every backend.
    pub async fn load(&self) -> std::result::Result<ReadReport, StorageError> {
        self.storage().read().await
    }

    /// Create a new document, write it everywhere, and open it.
    pub async fn create(&self, passphrase: &str, kdf: PassphraseKdf) -> Result<(DecryptedMessage, WriteReport)> {
        let decrypted = DecryptedMessage::create(passphrase, kdf)?;
        self.writer.idle().await;
        let report = self.storage().write(decrypted.message()).await?;
        self.open(decrypted.clone());
        Ok((decrypted, report))
    }

    /// Make `decrypted` the active session, held until paused.
    pub fn open(&self, decrypted: DecryptedMessage) {
        self.slot.publish(decrypted, None);
    }

    pub fn session(&self) -> Option<DecryptedMessage> {
        self.slot.current()
    }

    /// Record a new snapshot of the active session and schedule its write.
    pub fn save(&self, decrypted: DecryptedMessage) {
        if self.slot.current().is_some() {
            self.slot.update(decrypted.clone());
        } else {
            self.slot.publish(decrypted.clone(), None);
        }
        self.writer.schedule(decrypted.into_message());
    }

    /// Write the pending snapshot now.
    pub async fn flush(&self) -> std::result::Result<Option<WriteReport>, StorageError> {
        self.writer.flush().await
    }

    /// Flush pending writes and start the remember countdown.
    pub async fn pause(&self) -> std::result::Result<Option<WriteReport>, StorageError> {
        let flushed = self.writer.flush().await;
        self.slot.restart(self.remember_timeout);
        flushed
    }

    /// Cancel the countdown and return the session if it is still remembered.
    pub fn resume(&self) -> Option<DecryptedMessage> {
        self.slot.hold();
        self.slot.current()
    }

    /// Flush pending writes and forget the session.
    pub async fn lock(&self) -> std::result::Result<Option<WriteReport>, StorageError> {
        let flushed = self.writer.flush().await;
        self.slot.clear();
        flushed
    }
}
