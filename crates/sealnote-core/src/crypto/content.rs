//! Encrypted blobs with an attached integrity digest.
//!
//! AES-CBC is not authenticated, so every [`Content`] carries a digest of its
//! plaintext. Decryption recomputes it and compares in constant time; a
//! mismatch is how a wrong secret is detected when the padding happens to be
//! valid.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::cipher::{Cipher, CipherType, Direction};
use super::digest::DigestType;
use crate::error::CryptoError;

/// Digest written alongside every new content.
pub const DEFAULT_CONTENT_DIGEST: DigestType = DigestType::Sha1;

/// Ciphertext plus everything needed to decrypt and verify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub cipher_type: CipherType,
    pub digest_type: DigestType,
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub digest: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

impl Content {
    /// Encrypt `plaintext` with an encrypting cipher.
    pub fn encrypt(cipher: &Cipher, plaintext: &[u8]) -> Result<Self, CryptoError> {
        let digest = DEFAULT_CONTENT_DIGEST.digest(plaintext)?;
        let content = cipher.encrypt(plaintext)?;
        Ok(Self {
            cipher_type: cipher.cipher_type().clone(),
            digest_type: DEFAULT_CONTENT_DIGEST,
            iv: cipher.iv().to_vec(),
            digest,
            content,
        })
    }

    pub fn encrypt_with_secret(secret: &[u8], plaintext: &[u8]) -> Result<Self, CryptoError> {
        let cipher = Cipher::encryptor(secret)?;
        Self::encrypt(&cipher, plaintext)
    }

    /// Decrypting cipher for this content keyed by `secret`.
    pub fn decryptor(&self, secret: &[u8]) -> Result<Cipher, CryptoError> {
        Cipher::decryptor(&self.cipher_type, secret, &self.iv)
    }

    /// Decrypt with a cipher bound to this content's IV, then verify the digest.
    pub fn decrypt(&self, cipher: &Cipher) -> Result<Vec<u8>, CryptoError> {
        if let CipherType::Other(name) = &self.cipher_type {
            return Err(CryptoError::UnsupportedAlgorithm(name.clone()));
        }
        if cipher.direction() != Direction::Decrypt || cipher.iv() != self.iv.as_slice() {
            return Err(CryptoError::Decryption);
        }
        let plaintext = cipher.decrypt(&self.content)?;
        let expected = self.digest_type.digest(&plaintext)?;
        if expected.len() != self.digest.len() || !bool::from(expected.ct_eq(&self.digest)) {
            return Err(CryptoError::Integrity);
        }
        Ok(plaintext)
    }

    pub fn decrypt_with_secret(&self, secret: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = self.decryptor(secret)?;
        self.decrypt(&cipher)
    }
}

/// Standard base64 with padding for byte fields.
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_with_secret() {
        let content = Content::encrypt_with_secret(b"secret", b"hello world").unwrap();
        assert_eq!(content.iv.len(), 16);
        assert_eq!(content.digest_type, DigestType::Sha1);
        assert_eq!(content.decrypt_with_secret(b"secret").unwrap(), b"hello world");
    }

    #[test]
    fn test_empty_plaintext_round_trips() {
        let content = Content::encrypt_with_secret(b"secret", b"").unwrap();
        assert_eq!(content.content.len(), 16);
        assert!(content.decrypt_with_secret(b"secret").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let content = Content::encrypt_with_secret(b"secret", b"hello world").unwrap();
        let err = content.decrypt_with_secret(b"other").unwrap_err();
        assert!(matches!(err, CryptoError::Integrity | CryptoError::Decryption));
    }

    #[test]
    fn test_tampered_digest_fails_integrity() {
        let mut content = Content::encrypt_with_secret(b"secret", b"hello").unwrap();
        content.digest[0] ^= 0xff;
        assert_eq!(
            content.decrypt_with_secret(b"secret").unwrap_err(),
            CryptoError::Integrity
        );
    }

    #[test]
    fn test_truncated_digest_fails_integrity() {
        let mut content = Content::encrypt_with_secret(b"secret", b"hello").unwrap();
        content.digest.truncate(4);
        assert_eq!(
            content.decrypt_with_secret(b"secret").unwrap_err(),
            CryptoError::Integrity
        );
    }

    #[test]
    fn test_bad_iv_length_fails_decryption() {
        let mut content = Content::encrypt_with_secret(b"secret", b"hello").unwrap();
        content.iv.pop();
        assert_eq!(
            content.decrypt_with_secret(b"secret").unwrap_err(),
            CryptoError::Decryption
        );
    }

    #[test]
    fn test_cipher_bound_to_other_iv_is_rejected() {
        let a = Content::encrypt_with_secret(b"secret", b"a").unwrap();
        let b = Content::encrypt_with_secret(b"secret", b"b").unwrap();
        let cipher = a.decryptor(b"secret").unwrap();
        assert_eq!(b.decrypt(&cipher).unwrap_err(), CryptoError::Decryption);
    }

    #[test]
    fn test_json_field_names_and_base64() {
        let content = Content {
            cipher_type: CipherType::Aes128,
            digest_type: DigestType::Sha1,
            iv: vec![0u8; 16],
            digest: vec![1, 2, 3],
            content: vec![0xff; 16],
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["cipherType"], "AES_128");
        assert_eq!(json["digestType"], "SHA_1");
        assert_eq!(json["iv"], "AAAAAAAAAAAAAAAAAAAAAA==");
        assert_eq!(json["digest"], "AQID");
    }

    #[test]
    fn test_unknown_algorithms_decode_but_do_not_decrypt() {
        let json = r#"{"cipherType":"AES_256","digestType":"SHA_3","iv":"AAAAAAAAAAAAAAAAAAAAAA==","digest":"AQID","content":"AAAAAAAAAAAAAAAAAAAAAA=="}"#;
        let content: Content = serde_json::from_str(json).unwrap();
        assert_eq!(content.cipher_type, CipherType::Other("AES_256".to_string()));
        assert!(matches!(
            content.decrypt_with_secret(b"secret"),
            Err(CryptoError::UnsupportedAlgorithm(_))
        ));
    }
}
