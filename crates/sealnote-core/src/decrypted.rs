//! Unlocked document state.
//!
//! A [`DecryptedMessage`] is the only place the plaintext base key and note
//! live. Every mutation re-encrypts under the same base key and returns a new
//! snapshot; the previous one stays valid until dropped.

use std::fmt;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::crypto::{Cipher, Content, Key, Label, PassphraseKdf};
use crate::error::CryptoError;
use crate::message::Message;
use crate::session::SessionSlot;

/// Size of a freshly generated base key.
pub const BASE_KEY_SIZE: usize = 64;

#[derive(Clone, PartialEq, Eq)]
pub struct DecryptedMessage {
    message: Message,
    base_key: Zeroizing<Vec<u8>>,
    content: Zeroizing<String>,
}

impl DecryptedMessage {
    pub(crate) fn from_parts(
        message: Message,
        base_key: Zeroizing<Vec<u8>>,
        content: Zeroizing<String>,
    ) -> Self {
        Self {
            message,
            base_key,
            content,
        }
    }

    /// New document with a random base key, one passphrase key and empty content.
    pub fn create(passphrase: &str, kdf: PassphraseKdf) -> Result<Self, CryptoError> {
        let mut base_key = Zeroizing::new(vec![0u8; BASE_KEY_SIZE]);
        getrandom::getrandom(base_key.as_mut_slice()).map_err(|e| CryptoError::Random(e.to_string()))?;

        let key = passphrase_key(passphrase, kdf, &base_key)?;
        let content = Content::encrypt_with_secret(&base_key, b"")?;
        Ok(Self {
            message: Message {
                keys: vec![key],
                content,
            },
            base_key,
            content: Zeroizing::new(String::new()),
        })
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn into_message(self) -> Message {
        self.message
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub(crate) fn base_key(&self) -> &[u8] {
        &self.base_key
    }

    /// Re-encrypt with new content. Keys are unchanged.
    pub fn update_content(&self, content: &str) -> Result<Self, CryptoError> {
        let encrypted = Content::encrypt_with_secret(self.base_key(), content.as_bytes())?;
        Ok(Self {
            message: self.message.with_content(encrypted),
            base_key: self.base_key.clone(),
            content: Zeroizing::new(content.to_string()),
        })
    }

    /// Replace the passphrase key. Other keys are kept.
    pub fn change_passphrase(&self, passphrase: &str, kdf: PassphraseKdf) -> Result<Self, CryptoError> {
        let key = passphrase_key(passphrase, kdf, self.base_key())?;
        let mut keys: Vec<Key> = self
            .message
            .keys
            .iter()
            .filter(|key| !key.label.is_passphrase())
            .cloned()
            .collect();
        keys.push(key);
        Ok(self.with_keys(keys))
    }

    /// Wrap the base key for another unlock method.
    pub fn add_key(&self, label: Label, cipher: &Cipher) -> Result<(Self, Key), CryptoError> {
        let key = Key::wrap(label, cipher, self.base_key())?;
        let mut keys = self.message.keys.clone();
        keys.push(key.clone());
        Ok((self.with_keys(keys), key))
    }

    pub fn remove_keys(&self, keys: &[Key]) -> Result<Self, CryptoError> {
        let message = self.message.remove_keys(keys)?;
        Ok(self.with_keys(message.keys))
    }

    /// Publish into `slot` and wait until this publication ends.
    ///
    /// With a timeout the slot is cleared when it elapses, unless the session
    /// was replaced or cleared first. `None` keeps it until then.
    /// Nothing is published until the returned future is first polled.
    pub async fn remember(&self, slot: &SessionSlot, timeout: Option<Duration>) {
        let generation = slot.publish(self.clone(), timeout);
        slot.released(generation).await;
    }

    fn with_keys(&self, keys: Vec<Key>) -> Self {
        Self {
            message: Message {
                keys,
                content: self.message.content.clone(),
            },
            base_key: self.base_key.clone(),
            content: self.content.clone(),
        }
    }
}

fn passphrase_key(passphrase: &str, kdf: PassphraseKdf, base_key: &[u8]) -> Result<Key, CryptoError> {
    let label = Label::passphrase(kdf)?;
    let secret = label.passphrase_secret(passphrase)?;
    let cipher = Cipher::encryptor(&secret)?;
    Key::wrap(label, &cipher, base_key)
}

impl fmt::Debug for DecryptedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedMessage")
            .field("message", &self.message)
            .field("base_key", &"[REDACTED]")
            .field("content", &"[REDACTED]")
            .finish()
    }
}
