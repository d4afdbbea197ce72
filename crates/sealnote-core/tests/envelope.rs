mod common;

use proptest::prelude::*;
use sealnote_core::crypto::{Cipher, Content, Label, PassphraseKdf, SecureKeyStore};
use sealnote_core::{
    enroll_device, unlock_with_device, BiometricError, CryptoError, DecryptedMessage, Error,
    Message,
};

use common::MemoryKeyStore;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_content_round_trips(secret in prop::collection::vec(any::<u8>(), 0..80),
                           plaintext in prop::collection::vec(any::<u8>(), 0..300)) {
        let content = Content::encrypt_with_secret(&secret, &plaintext).unwrap();
        prop_assert_eq!(content.decrypt_with_secret(&secret).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_secret_never_yields_plaintext(first in prop::collection::vec(any::<u8>(), 1..32),
                                           second in prop::collection::vec(any::<u8>(), 1..32),
                                           plaintext in prop::collection::vec(any::<u8>(), 0..200)) {
        // Secrets are truncated or zero-padded to 16 bytes, so compare that form.
        let mut a = first.clone();
        a.resize(16, 0);
        let mut b = second.clone();
        b.resize(16, 0);
        prop_assume!(a[..16] != b[..16]);

        let content = Content::encrypt_with_secret(&first, &plaintext).unwrap();
        match content.decrypt_with_secret(&second) {
            Err(CryptoError::Integrity) | Err(CryptoError::Decryption) => {}
            other => prop_assert!(false, "unexpected result: {:?}", other),
        }
    }
}

#[test]
fn test_every_key_opens_the_same_document() {
    let decrypted = DecryptedMessage::create("correct", PassphraseKdf::Sha512)
        .unwrap()
        .update_content("secret")
        .unwrap();
    let cipher = Cipher::encryptor(b"second-method").unwrap();
    let (decrypted, added) = decrypted.add_key(Label::biometric_now(), &cipher).unwrap();

    let message = Message::decode(&decrypted.message().encode().unwrap()).unwrap();
    let via_passphrase = message.decrypt_with_passphrase("correct").unwrap();
    let via_added = message.decrypt_with_secret(&added, b"second-method").unwrap();

    assert_eq!(via_passphrase.content(), "secret");
    assert_eq!(via_added.content(), "secret");
    assert_eq!(via_passphrase, via_added);
}

#[test]
fn test_encoded_shape() {
    let message = DecryptedMessage::create("correct", PassphraseKdf::Sha512)
        .unwrap()
        .into_message();
    let json: serde_json::Value = serde_json::from_slice(&message.encode().unwrap()).unwrap();

    assert_eq!(json["keys"][0]["label"], "PASSPHRASE/SHA_512");
    let content = &json["content"];
    assert_eq!(content["cipherType"], "AES_128");
    assert_eq!(content["digestType"], "SHA_1");
    for field in ["iv", "digest", "content"] {
        assert!(content[field].is_string(), "{field} should be base64");
    }
}

#[test]
fn test_decodes_document_from_other_clients() {
    // Keys and content produced by hand with the documented scheme.
    let base_key = [0x42u8; 64];
    let passphrase_secret = sealnote_core::crypto::DigestType::Sha512
        .digest(b"correct")
        .unwrap();
    let key_content = Content::encrypt_with_secret(&passphrase_secret, &base_key).unwrap();
    let body = Content::encrypt_with_secret(&base_key, "hello".as_bytes()).unwrap();
    let json = serde_json::json!({
        "keys": [{"label": "PASSPHRASE", "content": key_content}],
        "content": body,
    });

    let message = Message::decode(&serde_json::to_vec(&json).unwrap()).unwrap();
    let decrypted = message.decrypt_with_passphrase("correct").unwrap();
    assert_eq!(decrypted.content(), "hello");
}

#[test]
fn test_device_enroll_and_unlock() {
    let store = MemoryKeyStore::new();
    let decrypted = DecryptedMessage::create("correct", PassphraseKdf::Sha512)
        .unwrap()
        .update_content("secret")
        .unwrap();

    let (enrolled, key) = enroll_device(&decrypted, &store).unwrap();
    let created_at = key.label.created_at().unwrap();

    let unlocked = unlock_with_device(enrolled.message(), &store, created_at).unwrap();
    assert_eq!(unlocked.content(), "secret");
}

#[test]
fn test_passphrase_change_keeps_device_unlock() {
    let store = MemoryKeyStore::new();
    let decrypted = DecryptedMessage::create("correct", PassphraseKdf::Sha512).unwrap();
    let (enrolled, key) = enroll_device(&decrypted, &store).unwrap();

    let changed = enrolled
        .change_passphrase("another passphrase", PassphraseKdf::Sha512)
        .unwrap();

    assert!(changed.message().keys.contains(&key));
    let created_at = key.label.created_at().unwrap();
    assert!(unlock_with_device(changed.message(), &store, created_at).is_ok());
}

#[test]
fn test_device_unlock_failures() {
    let store = MemoryKeyStore::new();
    let decrypted = DecryptedMessage::create("correct", PassphraseKdf::Sha512).unwrap();
    let (enrolled, key) = enroll_device(&decrypted, &store).unwrap();
    let created_at = key.label.created_at().unwrap();

    store.set_confirm(false);
    assert!(matches!(
        unlock_with_device(enrolled.message(), &store, created_at),
        Err(Error::Biometric(BiometricError::Cancelled))
    ));

    store.set_confirm(true);
    store.delete_key().unwrap();
    assert!(matches!(
        unlock_with_device(enrolled.message(), &store, created_at),
        Err(Error::Biometric(BiometricError::Unavailable))
    ));

    assert!(matches!(
        unlock_with_device(decrypted.message(), &store, created_at),
        Err(Error::Crypto(CryptoError::MissingKey))
    ));
}

#[test]
fn test_new_device_key_does_not_open_old_enrollment() {
    let store = MemoryKeyStore::new();
    let decrypted = DecryptedMessage::create("correct", PassphraseKdf::Sha512).unwrap();
    let (enrolled, key) = enroll_device(&decrypted, &store).unwrap();
    let created_at = key.label.created_at().unwrap();

    store.delete_key().unwrap();
    store.get_or_create_key().unwrap();

    let err = unlock_with_device(enrolled.message(), &store, created_at).unwrap_err();
    assert!(matches!(
        err,
        Error::Crypto(CryptoError::Integrity) | Error::Crypto(CryptoError::Decryption)
    ));
}
