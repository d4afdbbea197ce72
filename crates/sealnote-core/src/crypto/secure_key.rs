//! Device-bound key store interface.
//!
//! Implementations hold a symmetric key that never leaves the device and
//! release ciphers over it only after a user-presence check.

use std::fmt;

use zeroize::Zeroizing;

use super::cipher::Cipher;
use crate::error::BiometricError;

/// Opaque device key material.
#[derive(Clone)]
pub struct KeyHandle {
    bytes: Zeroizing<Vec<u8>>,
}

impl KeyHandle {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Zeroizing::new(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandle")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

pub trait SecureKeyStore: Send + Sync {
    /// This device's key, generated on first use.
    fn get_or_create_key(&self) -> Result<KeyHandle, BiometricError>;

    /// Encrypting cipher over `handle` with a fresh IV.
    fn encrypt_cipher(&self, handle: &KeyHandle) -> Result<Cipher, BiometricError> {
        Cipher::encryptor(handle.as_bytes()).map_err(|e| BiometricError::Store(e.to_string()))
    }

    /// Decrypting cipher for content written with `iv`.
    ///
    /// Fails with [`BiometricError::Unavailable`] when the device key is gone.
    fn decrypt_cipher(&self, iv: &[u8]) -> Result<Cipher, BiometricError>;

    /// Presence check. Returns the cipher once the user has confirmed, or
    /// [`BiometricError::Cancelled`].
    fn authenticate(&self, cipher: Cipher) -> Result<Cipher, BiometricError>;

    /// Remove the device key. Removing a missing key is not an error.
    fn delete_key(&self) -> Result<(), BiometricError>;
}
