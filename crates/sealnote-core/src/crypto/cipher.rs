//! Block cipher selection and initialized cipher handles.
//!
//! The only cipher written by this crate is AES-128 in CBC mode with PKCS#7
//! padding, named `AES_128` on the wire. Keys are derived from arbitrary
//! secrets by truncating or zero-padding them to the block size. That is the
//! legacy v1 scheme and is not a KDF: it is safe only because every secret
//! fed to it is either a full-entropy random key or a digest of one.

use std::fmt;

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CryptoError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES block size, which is also the derived key size and the IV size.
pub const BLOCK_SIZE: usize = 16;

/// Cipher algorithm recorded in a [`Content`](super::Content).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CipherType {
    #[default]
    Aes128,
    /// A name written by a newer client; decrypting with it always fails.
    Other(String),
}

impl CipherType {
    pub fn as_str(&self) -> &str {
        match self {
            CipherType::Aes128 => "AES_128",
            CipherType::Other(name) => name,
        }
    }

    /// IV length for this cipher.
    pub fn iv_size(&self) -> Option<usize> {
        match self {
            CipherType::Aes128 => Some(BLOCK_SIZE),
            CipherType::Other(_) => None,
        }
    }
}

impl From<String> for CipherType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "AES_128" => CipherType::Aes128,
            _ => CipherType::Other(value),
        }
    }
}

impl From<CipherType> for String {
    fn from(value: CipherType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CipherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// An initialized, direction-bound cipher.
///
/// Raw secrets and device-held keys both end up as a `Cipher`, so content
/// encryption does not need to know where the key came from. An encrypting
/// cipher picks its own random IV; a decrypting one is bound to the IV stored
/// in the content it will open.
#[derive(Clone)]
pub struct Cipher {
    cipher_type: CipherType,
    key: Zeroizing<[u8; BLOCK_SIZE]>,
    iv: [u8; BLOCK_SIZE],
    direction: Direction,
}

impl Cipher {
    /// Encrypting cipher keyed by `secret`, with a fresh random IV.
    pub fn encryptor(secret: &[u8]) -> Result<Self, CryptoError> {
        let mut iv = [0u8; BLOCK_SIZE];
        getrandom::getrandom(&mut iv).map_err(|e| CryptoError::Random(e.to_string()))?;
        Ok(Self {
            cipher_type: CipherType::Aes128,
            key: derive_block_key(secret),
            iv,
            direction: Direction::Encrypt,
        })
    }

    /// Decrypting cipher keyed by `secret` for content written with `iv`.
    pub fn decryptor(
        cipher_type: &CipherType,
        secret: &[u8],
        iv: &[u8],
    ) -> Result<Self, CryptoError> {
        if let CipherType::Other(name) = cipher_type {
            return Err(CryptoError::UnsupportedAlgorithm(name.clone()));
        }
        let iv: [u8; BLOCK_SIZE] = iv.try_into().map_err(|_| CryptoError::Decryption)?;
        Ok(Self {
            cipher_type: cipher_type.clone(),
            key: derive_block_key(secret),
            iv,
            direction: Direction::Decrypt,
        })
    }

    pub fn cipher_type(&self) -> &CipherType {
        &self.cipher_type
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub(crate) fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if self.direction != Direction::Encrypt {
            return Err(CryptoError::InvalidInput(
                "Cipher was initialized for decryption".to_string(),
            ));
        }
        let encryptor = Aes128CbcEnc::new_from_slices(self.key.as_slice(), &self.iv)
            .map_err(|_| CryptoError::InvalidInput("Invalid key or IV length".to_string()))?;
        Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }

    pub(crate) fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if self.direction != Direction::Decrypt {
            return Err(CryptoError::InvalidInput(
                "Cipher was initialized for encryption".to_string(),
            ));
        }
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::Decryption);
        }
        let decryptor = Aes128CbcDec::new_from_slices(self.key.as_slice(), &self.iv)
            .map_err(|_| CryptoError::Decryption)?;
        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::Decryption)
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("cipher_type", &self.cipher_type)
            .field("key", &"[REDACTED]")
            .field("direction", &self.direction)
            .finish()
    }
}

/// Truncate or zero-pad `secret` to one block.
fn derive_block_key(secret: &[u8]) -> Zeroizing<[u8; BLOCK_SIZE]> {
    let mut key = Zeroizing::new([0u8; BLOCK_SIZE]);
    let len = secret.len().min(BLOCK_SIZE);
    key[..len].copy_from_slice(&secret[..len]);
    key
}
