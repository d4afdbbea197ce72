//! Passphrase stretching with Argon2id.
//!
//! Only used by passphrase keys labelled `PASSPHRASE/ARGON2ID:<salt>`. The
//! legacy label family hashes the passphrase with a single digest instead,
//! which remains the default so older clients can still open new documents.

use argon2::Argon2;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

/// Argon2id parameters.
///
/// - Memory: 64 MB (64 * 1024 KB)
/// - Iterations: 3
/// - Parallelism: 1
const ARGON2_MEMORY_KB: u32 = 64 * 1024;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;

/// Length of the derived unlock secret in bytes.
pub const KEY_LENGTH: usize = 32;

/// Length of the random salt stored in the label.
pub const SALT_LENGTH: usize = 16;

/// An unlock secret derived from a passphrase.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    /// Avoid storing or logging this value.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Fresh random salt for a new Argon2id passphrase key.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH], CryptoError> {
    let mut salt = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt).map_err(|e| CryptoError::Random(e.to_string()))?;
    Ok(salt)
}

/// Derive an unlock secret from a passphrase using Argon2id.
///
/// Same passphrase and salt always produce the same key; the salt must be
/// at least [`SALT_LENGTH`] bytes.
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Result<DerivedKey, CryptoError> {
    if passphrase.is_empty() {
        return Err(CryptoError::InvalidInput(
            "Passphrase cannot be empty".to_string(),
        ));
    }

    if salt.len() < SALT_LENGTH {
        return Err(CryptoError::InvalidInput(format!(
            "Salt must be at least {} bytes",
            SALT_LENGTH
        )));
    }

    let params = argon2::Params::new(
        ARGON2_MEMORY_KB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(KEY_LENGTH),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("Failed to create Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key = [0u8; KEY_LENGTH];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(DerivedKey { key })
}
