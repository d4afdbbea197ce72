//! Error types for SealNote core operations.
//!
//! Each concern (cryptography, device keys, storage backends, the
//! synchronization engine) has its own error enum. The crate-level [`Error`]
//! wraps them so callers that do not care about the distinction can use a
//! single `Result` type; the CLI layer maps these to user-facing messages.

use std::fmt;

use thiserror::Error;

/// Result type alias for SealNote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Umbrella error for core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Biometric(#[from] BiometricError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the cryptographic envelope.
///
/// None of these are fatal to the process: they all mean "this secret does
/// not open this document" except [`CryptoError::BaseKeyMismatch`], which
/// means the document itself is inconsistent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Malformed ciphertext, IV, or padding.
    #[error("Decryption failed: malformed ciphertext or padding")]
    Decryption,

    /// Digest mismatch after decryption (wrong secret or corrupted content).
    #[error("Integrity check failed: wrong secret or corrupted content")]
    Integrity,

    /// No key of the requested unlock type exists in the message.
    #[error("No matching key in message")]
    MissingKey,

    /// A key unwrapped but the content did not decrypt with the result.
    #[error("Base key does not match document content")]
    BaseKeyMismatch,

    /// Removing the requested keys would leave the document with no keys.
    #[error("Refusing to remove the last key of the document")]
    LastKey,

    /// Cipher or digest name this build does not implement.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// OS randomness source failed.
    #[error("Random generation failed: {0}")]
    Random(String),

    /// Passphrase derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Invalid user input (e.g. a passphrase that is too short).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Outcomes of the device-bound key store that are not plain successes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BiometricError {
    /// The device key is gone (never created, or invalidated by the OS).
    #[error("Device key is unavailable")]
    Unavailable,

    /// The user declined or failed the presence check.
    #[error("Device unlock cancelled")]
    Cancelled,

    /// The key store itself failed.
    #[error("Device key store error: {0}")]
    Store(String),
}

/// Failure of a single storage backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote storage rejected credentials (status {0})")]
    Unauthorized(u16),

    #[error("More than one {0} file in remote storage; resolve manually")]
    MoreThanOneRemoteFile(String),

    #[error("Invalid response from remote storage: {0}")]
    InvalidResponse(String),

    #[error("Sign-in failed: {0}")]
    Auth(String),
}

/// A backend failure tagged with the backend's name.
#[derive(Debug)]
pub struct BackendFailure {
    pub backend: String,
    pub error: BackendError,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

/// Failures of the synchronization engine as a whole.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Every backend failed; nothing was read or written.
    #[error("All storage backends failed: {}", join_failures(.0))]
    AllBackendsFailed(Vec<BackendFailure>),

    /// Some backends failed and the rest are empty, so it is unknown whether
    /// a document exists.
    #[error("Cannot tell whether a document exists: {}", join_failures(.0))]
    Inconclusive(Vec<BackendFailure>),

    /// The authoritative bytes are not a valid message.
    #[error("Failed to decode stored message: {0}")]
    Decode(String),

    /// The message could not be serialized.
    #[error("Failed to encode message: {0}")]
    Encode(String),
}

fn join_failures(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
