//! # SealNote Core
//!
//! Core library for SealNote - a single encrypted note kept in sync across
//! independent storage backends.
//!
//! This crate provides the cryptographic envelope, the remembered-session
//! slot, and the storage synchronization engine, independent of the CLI.
//!
//! ## Architecture
//!
//! - **crypto**: content encryption, unlock keys and labels, passphrase KDF
//! - **message**: the stored envelope and its JSON encoding
//! - **decrypted**: unlocked state and the mutations on it
//! - **session**: single-slot remembered session with expiry
//! - **storage**: backends, the newest-wins engine, and the write queue
//! - **vault**: controller tying storage, writes and session together

pub mod crypto;
pub mod decrypted;
pub mod device;
pub mod error;
pub mod fs;
pub mod message;
pub mod session;
pub mod storage;
pub mod vault;

pub use decrypted::DecryptedMessage;
pub use device::{enroll_device, unlock_with_device};
pub use error::{BackendError, BackendFailure, BiometricError, CryptoError, Error, Result, StorageError};
pub use message::Message;
pub use session::SessionSlot;
pub use storage::{Storage, StorageFormat, WriteQueue};
pub use vault::{Vault, VaultOptions};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
