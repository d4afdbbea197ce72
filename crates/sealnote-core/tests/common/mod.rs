#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sealnote_core::crypto::{Cipher, CipherType, KeyHandle, SecureKeyStore};
use sealnote_core::storage::{StorageFormat, StoredBlob};
use sealnote_core::{BackendError, BiometricError};

/// In-memory backend with failure injection and a write log.
pub struct MemoryBackend {
    name: String,
    blob: Mutex<Option<StoredBlob>>,
    writes: Mutex<Vec<StoredBlob>>,
    reads: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_delay: Mutex<Duration>,
}

impl MemoryBackend {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            blob: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            reads: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            write_delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn with_blob(name: &str, blob: StoredBlob) -> Arc<Self> {
        let backend = Self::new(name);
        backend.set(Some(blob));
        backend
    }

    pub fn set(&self, blob: Option<StoredBlob>) {
        *self.blob.lock().unwrap() = blob;
    }

    pub fn get(&self) -> Option<StoredBlob> {
        self.blob.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<StoredBlob> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl StorageFormat for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<Option<StoredBlob>, BackendError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::InvalidResponse(format!("{} is down", self.name)));
        }
        Ok(self.get())
    }

    async fn write(&self, blob: &StoredBlob) -> Result<(), BackendError> {
        let delay = *self.write_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::InvalidResponse(format!("{} is down", self.name)));
        }
        self.writes.lock().unwrap().push(blob.clone());
        self.set(Some(blob.clone()));
        Ok(())
    }
}

/// Device key store held in memory, with a scripted presence check.
pub struct MemoryKeyStore {
    key: Mutex<Option<Vec<u8>>>,
    confirm: AtomicBool,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self {
            key: Mutex::new(None),
            confirm: AtomicBool::new(true),
        }
    }

    pub fn set_confirm(&self, confirm: bool) {
        self.confirm.store(confirm, Ordering::SeqCst);
    }
}

impl SecureKeyStore for MemoryKeyStore {
    fn get_or_create_key(&self) -> Result<KeyHandle, BiometricError> {
        let mut key = self.key.lock().unwrap();
        let bytes = key.get_or_insert_with(|| {
            let mut bytes = vec![0u8; 16];
            getrandom::getrandom(&mut bytes).unwrap();
            bytes
        });
        Ok(KeyHandle::new(bytes.clone()))
    }

    fn decrypt_cipher(&self, iv: &[u8]) -> Result<Cipher, BiometricError> {
        let key = self.key.lock().unwrap().clone().ok_or(BiometricError::Unavailable)?;
        Cipher::decryptor(&CipherType::Aes128, &key, iv)
            .map_err(|e| BiometricError::Store(e.to_string()))
    }

    fn authenticate(&self, cipher: Cipher) -> Result<Cipher, BiometricError> {
        if self.confirm.load(Ordering::SeqCst) {
            Ok(cipher)
        } else {
            Err(BiometricError::Cancelled)
        }
    }

    fn delete_key(&self) -> Result<(), BiometricError> {
        *self.key.lock().unwrap() = None;
        Ok(())
    }
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(seconds)
}
