//! Device key held in the OS keyring.
//!
//! Stands in for a hardware-backed biometric key: a random AES key is
//! generated on enrollment, kept in the keyring under an account derived from
//! the local note path, and only released after the user confirms at the
//! terminal.

use std::io::IsTerminal;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dialoguer::Confirm;
use zeroize::Zeroizing;

use sealnote_core::crypto::{Cipher, CipherType, KeyHandle, SecureKeyStore};
use sealnote_core::BiometricError;

use crate::constants::KEYRING_SERVICE;

const DEVICE_KEY_LENGTH: usize = 16;

pub struct KeyringStore {
    account: String,
    interactive: bool,
}

impl KeyringStore {
    pub fn new(local_path: &Path, interactive: bool) -> Self {
        Self {
            account: device_account(local_path),
            interactive,
        }
    }

    fn entry(&self) -> Result<keyring::Entry, BiometricError> {
        keyring::Entry::new(KEYRING_SERVICE, &self.account)
            .map_err(|e| BiometricError::Store(format!("Keychain entry failed: {}", e)))
    }

    fn read_key(&self) -> Result<Option<Zeroizing<Vec<u8>>>, BiometricError> {
        let encoded = match self.entry()?.get_password() {
            Ok(value) => Zeroizing::new(value),
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(err) => {
                return Err(BiometricError::Store(format!(
                    "Keychain read failed: {}",
                    err
                )))
            }
        };
        let bytes = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| BiometricError::Store(format!("Keychain value is corrupt: {}", e)))?;
        Ok(Some(Zeroizing::new(bytes)))
    }
}

impl SecureKeyStore for KeyringStore {
    fn get_or_create_key(&self) -> Result<KeyHandle, BiometricError> {
        if let Some(bytes) = self.read_key()? {
            return Ok(KeyHandle::new(bytes.to_vec()));
        }
        let bytes = generate_key_bytes()?;
        let encoded = Zeroizing::new(STANDARD.encode(&bytes));
        self.entry()?
            .set_password(&encoded)
            .map_err(|e| BiometricError::Store(format!("Keychain write failed: {}", e)))?;
        Ok(KeyHandle::new(bytes.to_vec()))
    }

    fn decrypt_cipher(&self, iv: &[u8]) -> Result<Cipher, BiometricError> {
        let bytes = self.read_key()?.ok_or(BiometricError::Unavailable)?;
        Cipher::decryptor(&CipherType::Aes128, &bytes, iv)
            .map_err(|e| BiometricError::Store(e.to_string()))
    }

    fn authenticate(&self, cipher: Cipher) -> Result<Cipher, BiometricError> {
        if !self.interactive || !std::io::stdin().is_terminal() {
            return Err(BiometricError::Cancelled);
        }
        let confirmed = Confirm::new()
            .with_prompt("Use this device's key to unlock?")
            .default(true)
            .interact()
            .map_err(|e| BiometricError::Store(format!("Failed to read confirmation: {}", e)))?;
        if confirmed {
            Ok(cipher)
        } else {
            Err(BiometricError::Cancelled)
        }
    }

    fn delete_key(&self) -> Result<(), BiometricError> {
        match self.entry()?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(BiometricError::Store(format!(
                "Keychain delete failed: {}",
                err
            ))),
        }
    }
}

fn generate_key_bytes() -> Result<Zeroizing<[u8; DEVICE_KEY_LENGTH]>, BiometricError> {
    let mut bytes = Zeroizing::new([0u8; DEVICE_KEY_LENGTH]);
    getrandom::getrandom(bytes.as_mut())
        .map_err(|e| BiometricError::Store(format!("Failed to generate key bytes: {}", e)))?;
    Ok(bytes)
}

/// Keyring account for the note at `path`.
pub fn device_account(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let hash = blake3::hash(canonical.to_string_lossy().as_bytes());
    hash.to_hex()[..16].to_string()
}
