//! Unlocking and enrolling with a device-held key.

use chrono::{DateTime, Utc};

use crate::crypto::{Key, Label, SecureKeyStore};
use crate::decrypted::DecryptedMessage;
use crate::error::{CryptoError, Result};
use crate::message::Message;

/// Open `message` with the device key enrolled at `created_at`.
///
/// Fails with `CryptoError::MissingKey` when the document has no such key,
/// `BiometricError::Unavailable` when the device key is gone, and
/// `BiometricError::Cancelled` when the presence check is declined.
pub fn unlock_with_device(
    message: &Message,
    store: &dyn SecureKeyStore,
    created_at: DateTime<Utc>,
) -> Result<DecryptedMessage> {
    let key = message
        .find_biometric(created_at)
        .ok_or(CryptoError::MissingKey)?;
    let cipher = store.decrypt_cipher(&key.content.iv)?;
    let cipher = store.authenticate(cipher)?;
    Ok(message.decrypt(key, &cipher)?)
}

/// Wrap the base key with this device's key under a new biometric label.
pub fn enroll_device(
    decrypted: &DecryptedMessage,
    store: &dyn SecureKeyStore,
) -> Result<(DecryptedMessage, Key)> {
    let handle = store.get_or_create_key()?;
    let cipher = store.encrypt_cipher(&handle)?;
    let cipher = store.authenticate(cipher)?;
    Ok(decrypted.add_key(Label::biometric_now(), &cipher)?)
}
