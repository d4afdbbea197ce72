//! The durable envelope: unlock keys plus one encrypted content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::{Cipher, Content, Key, Label};
use crate::decrypted::DecryptedMessage;
use crate::error::{CryptoError, StorageError};

/// An encrypted document as stored on every backend.
///
/// Every key wraps the same base key, and `content` is encrypted under it.
/// Values are immutable; operations that change a message return a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub keys: Vec<Key>,
    pub content: Content,
}

impl Message {
    /// Unwrap `key` with a decrypting cipher and open the content.
    ///
    /// A key that does not unwrap is a user error (`Integrity` or
    /// `Decryption`). A key that unwraps but does not open the content means
    /// the document is inconsistent and yields `BaseKeyMismatch`. Invalid
    /// UTF-8 in the content is replaced, not rejected.
    pub fn decrypt(&self, key: &Key, cipher: &Cipher) -> Result<DecryptedMessage, CryptoError> {
        let base_key = key.unwrap_base_key(cipher)?;
        let plaintext = Zeroizing::new(self.content.decrypt_with_secret(&base_key).map_err(|e| {
            match e {
                CryptoError::UnsupportedAlgorithm(_) => e,
                _ => CryptoError::BaseKeyMismatch,
            }
        })?);
        let content = Zeroizing::new(String::from_utf8_lossy(&plaintext).into_owned());
        Ok(DecryptedMessage::from_parts(self.clone(), base_key, content))
    }

    pub fn decrypt_with_secret(
        &self,
        key: &Key,
        secret: &[u8],
    ) -> Result<DecryptedMessage, CryptoError> {
        let cipher = key.content.decryptor(secret)?;
        self.decrypt(key, &cipher)
    }

    /// Try every key that accepts a passphrase.
    pub fn decrypt_with_passphrase(
        &self,
        passphrase: &str,
    ) -> Result<DecryptedMessage, CryptoError> {
        let mut last_error = CryptoError::MissingKey;
        for key in self.keys.iter().filter(|key| key.label.accepts_passphrase()) {
            let attempt = key
                .label
                .passphrase_secret(passphrase)
                .and_then(|secret| self.decrypt_with_secret(key, &secret));
            match attempt {
                Ok(decrypted) => return Ok(decrypted),
                Err(CryptoError::BaseKeyMismatch) => return Err(CryptoError::BaseKeyMismatch),
                Err(e) => last_error = e,
            }
        }
        Err(last_error)
    }

    /// The device key enrolled at `created_at`.
    pub fn find_biometric(&self, created_at: DateTime<Utc>) -> Option<&Key> {
        self.keys
            .iter()
            .find(|key| key.label.created_at() == Some(created_at))
    }

    pub fn passphrase_key(&self) -> Option<&Key> {
        self.keys.iter().find(|key| key.label.is_passphrase())
    }

    pub fn find_key(&self, label: &Label) -> Option<&Key> {
        self.keys.iter().find(|key| &key.label == label)
    }

    pub fn with_content(&self, content: Content) -> Self {
        Self {
            keys: self.keys.clone(),
            content,
        }
    }

    /// Copy without `keys`. Refuses to leave the document with no keys.
    pub fn remove_keys(&self, keys: &[Key]) -> Result<Self, CryptoError> {
        let remaining: Vec<Key> = self
            .keys
            .iter()
            .filter(|key| !keys.contains(key))
            .cloned()
            .collect();
        if remaining.is_empty() {
            return Err(CryptoError::LastKey);
        }
        Ok(Self {
            keys: remaining,
            content: self.content.clone(),
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        serde_json::to_vec(self).map_err(|e| StorageError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PassphraseKdf;

    fn created(passphrase: &str) -> DecryptedMessage {
        DecryptedMessage::create(passphrase, PassphraseKdf::Sha512).unwrap()
    }

    #[test]
    fn test_decrypt_with_passphrase() {
        let message = created("correct").message().clone();
        let decrypted = message.decrypt_with_passphrase("correct").unwrap();
        assert_eq!(decrypted.content(), "");
    }

    #[test]
    fn test_wrong_passphrase_is_rejected() {
        let message = created("correct").message().clone();
        let err = message.decrypt_with_passphrase("incorrect").unwrap_err();
        assert!(matches!(err, CryptoError::Integrity | CryptoError::Decryption));
    }

    #[test]
    fn test_missing_passphrase_key() {
        let decrypted = created("correct");
        let cipher = Cipher::encryptor(b"device").unwrap();
        let (with_device, device_key) = decrypted
            .add_key(Label::biometric_now(), &cipher)
            .unwrap();
        let passphrase_key = with_device.message().passphrase_key().unwrap().clone();
        let device_only = with_device.message().remove_keys(&[passphrase_key]).unwrap();

        assert_eq!(device_only.keys, vec![device_key]);
        assert_eq!(
            device_only.decrypt_with_passphrase("correct").unwrap_err(),
            CryptoError::MissingKey
        );
    }

    #[test]
    fn test_base_key_mismatch() {
        let a = created("correct").message().clone();
        let b = created("correct").message().clone();
        let inconsistent = Message {
            keys: a.keys.clone(),
            content: b.content.clone(),
        };
        assert_eq!(
            inconsistent.decrypt_with_passphrase("correct").unwrap_err(),
            CryptoError::BaseKeyMismatch
        );
    }

    #[test]
    fn test_invalid_utf8_content_opens_lossily() {
        let decrypted = created("correct");
        let content = Content::encrypt_with_secret(decrypted.base_key(), b"note \xff\xfe end").unwrap();
        let message = decrypted.message().with_content(content);

        let reopened = message.decrypt_with_passphrase("correct").unwrap();
        assert_eq!(reopened.content(), "note \u{FFFD}\u{FFFD} end");
    }

    #[test]
    fn test_removing_every_key_is_refused() {
        let message = created("correct").message().clone();
        let all = message.keys.clone();
        assert_eq!(message.remove_keys(&all).unwrap_err(), CryptoError::LastKey);
    }

    #[test]
    fn test_encode_decode_preserves_unknown_labels() {
        let message = created("correct").message().clone();
        let mut json: serde_json::Value = serde_json::from_slice(&message.encode().unwrap()).unwrap();
        json["keys"][0]["label"] = serde_json::Value::String("FIDO/abc".to_string());
        let bytes = serde_json::to_vec(&json).unwrap();

        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded.keys[0].label, Label::Unknown("FIDO/abc".to_string()));
        let reencoded: serde_json::Value =
            serde_json::from_slice(&decoded.encode().unwrap()).unwrap();
        assert_eq!(reencoded, json);
    }

    #[test]
    fn test_unknown_label_fails_cleanly() {
        let message = created("correct").message().clone();
        let mut key = message.keys[0].clone();
        key.label = Label::Unknown("FIDO/abc".to_string());
        let unknown_only = Message {
            keys: vec![key],
            content: message.content.clone(),
        };
        // The unknown label is tried with the default digest, which matches
        // the original passphrase key's derivation.
        assert!(unknown_only.decrypt_with_passphrase("correct").is_ok());
        assert!(unknown_only.decrypt_with_passphrase("nope").is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            Message::decode(b"not json"),
            Err(StorageError::Decode(_))
        ));
    }

    #[test]
    fn test_find_biometric() {
        let decrypted = created("correct");
        let cipher = Cipher::encryptor(b"device").unwrap();
        let label = Label::parse("BIOMETRIC/2024-01-01T00:00:00Z");
        let created_at = label.created_at().unwrap();
        let (with_device, _) = decrypted.add_key(label, &cipher).unwrap();

        assert!(with_device.message().find_biometric(created_at).is_some());
        assert!(with_device
            .message()
            .find_biometric(Utc::now())
            .is_none());
    }
}
