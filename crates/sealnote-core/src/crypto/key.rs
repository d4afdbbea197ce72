//! Unlock keys and their labels.
//!
//! A [`Key`] wraps the document's base key once per unlock method. Its
//! [`Label`] names the method and carries whatever parameters are needed to
//! turn user input into the wrapping secret. Labels are written as
//! `"<TYPE>/<params>"` strings, e.g. `PASSPHRASE/SHA_512` or
//! `BIOMETRIC/2024-01-01T00:00:00Z`.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::cipher::Cipher;
use super::content::Content;
use super::digest::DigestType;
use super::kdf;
use crate::error::CryptoError;

const PASSPHRASE: &str = "PASSPHRASE";
const BIOMETRIC: &str = "BIOMETRIC";
const ARGON2ID_PREFIX: &str = "ARGON2ID:";
const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Digest applied to passphrases when a label does not name one.
pub const DEFAULT_PASSPHRASE_DIGEST: DigestType = DigestType::Sha512;

/// How a new passphrase key turns the passphrase into its unlock secret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PassphraseKdf {
    /// Single SHA-512 digest. Readable by every client.
    #[default]
    Sha512,
    /// Argon2id with a random salt. Not readable by legacy clients.
    Argon2id,
}

/// Parameters of a passphrase label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PassphraseDerivation {
    Digest(DigestType),
    Argon2id { salt: Vec<u8> },
}

/// Unlock method identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Label {
    Passphrase(PassphraseDerivation),
    Biometric { created_at: DateTime<Utc> },
    /// A label this client does not understand, kept verbatim.
    Unknown(String),
}

impl Label {
    /// Label for a new passphrase key.
    pub fn passphrase(kdf: PassphraseKdf) -> Result<Self, CryptoError> {
        let derivation = match kdf {
            PassphraseKdf::Sha512 => PassphraseDerivation::Digest(DEFAULT_PASSPHRASE_DIGEST),
            PassphraseKdf::Argon2id => PassphraseDerivation::Argon2id {
                salt: kdf::generate_salt()?.to_vec(),
            },
        };
        Ok(Label::Passphrase(derivation))
    }

    /// Label for a new device enrollment, stamped with the current second.
    pub fn biometric_now() -> Self {
        Label::Biometric {
            created_at: Utc::now().trunc_subsecs(0),
        }
    }

    pub fn parse(raw: &str) -> Self {
        let (kind, params) = match raw.split_once('/') {
            Some((kind, params)) => (kind, Some(params)),
            None => (raw, None),
        };
        let parsed = match (kind, params) {
            (PASSPHRASE, None) => Some(Label::Passphrase(PassphraseDerivation::Digest(
                DEFAULT_PASSPHRASE_DIGEST,
            ))),
            (PASSPHRASE, Some(params)) => parse_passphrase_params(params).map(Label::Passphrase),
            (BIOMETRIC, Some(params)) => parse_created_at(params)
                .map(|created_at| Label::Biometric { created_at }),
            _ => None,
        };
        parsed.unwrap_or_else(|| Label::Unknown(raw.to_string()))
    }

    /// True for labels tried when unlocking with a passphrase.
    ///
    /// Unknown labels are included: the attempt fails with an integrity error.
    pub fn accepts_passphrase(&self) -> bool {
        matches!(self, Label::Passphrase(_) | Label::Unknown(_))
    }

    pub fn is_passphrase(&self) -> bool {
        matches!(self, Label::Passphrase(_))
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Label::Biometric { created_at } => Some(*created_at),
            _ => None,
        }
    }

    /// Unlock secret for `passphrase` under this label.
    pub fn passphrase_secret(&self, passphrase: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        match self {
            Label::Passphrase(PassphraseDerivation::Digest(digest)) => {
                Ok(Zeroizing::new(digest.digest(passphrase.as_bytes())?))
            }
            Label::Passphrase(PassphraseDerivation::Argon2id { salt }) => {
                let key = kdf::derive_key(passphrase, salt)?;
                Ok(Zeroizing::new(key.as_bytes().to_vec()))
            }
            Label::Unknown(_) => Ok(Zeroizing::new(
                DEFAULT_PASSPHRASE_DIGEST.digest(passphrase.as_bytes())?,
            )),
            Label::Biometric { .. } => Err(CryptoError::InvalidInput(
                "Device keys are not unlocked with a passphrase".to_string(),
            )),
        }
    }
}

fn parse_passphrase_params(params: &str) -> Option<PassphraseDerivation> {
    if let Some(salt) = params.strip_prefix(ARGON2ID_PREFIX) {
        let salt = STANDARD.decode(salt).ok()?;
        if salt.len() < kdf::SALT_LENGTH {
            return None;
        }
        return Some(PassphraseDerivation::Argon2id { salt });
    }
    DigestType::parse_known(params).map(PassphraseDerivation::Digest)
}

/// Only the canonical second-precision UTC form is accepted, so a parsed
/// label always re-encodes to the same string.
fn parse_created_at(params: &str) -> Option<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(params).ok()?.with_timezone(&Utc);
    (parsed.format(CREATED_AT_FORMAT).to_string() == params).then_some(parsed)
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Passphrase(PassphraseDerivation::Digest(digest)) => {
                write!(f, "{}/{}", PASSPHRASE, digest)
            }
            Label::Passphrase(PassphraseDerivation::Argon2id { salt }) => {
                write!(f, "{}/{}{}", PASSPHRASE, ARGON2ID_PREFIX, STANDARD.encode(salt))
            }
            Label::Biometric { created_at } => {
                write!(f, "{}/{}", BIOMETRIC, created_at.format(CREATED_AT_FORMAT))
            }
            Label::Unknown(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::parse(&value)
    }
}

impl From<Label> for String {
    fn from(value: Label) -> Self {
        value.to_string()
    }
}

/// The base key wrapped for one unlock method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub label: Label,
    pub content: Content,
}

impl Key {
    /// Wrap `base_key` with an encrypting cipher.
    pub fn wrap(label: Label, cipher: &Cipher, base_key: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            label,
            content: Content::encrypt(cipher, base_key)?,
        })
    }

    /// Recover the base key with a decrypting cipher.
    pub fn unwrap_base_key(&self, cipher: &Cipher) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        self.content.decrypt(cipher).map(Zeroizing::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passphrase_labels_parse() {
        assert_eq!(
            Label::parse("PASSPHRASE/SHA_512"),
            Label::Passphrase(PassphraseDerivation::Digest(DigestType::Sha512))
        );
        assert_eq!(
            Label::parse("PASSPHRASE/SHA_1"),
            Label::Passphrase(PassphraseDerivation::Digest(DigestType::Sha1))
        );
    }

    #[test]
    fn test_bare_passphrase_uses_default_digest() {
        let label = Label::parse("PASSPHRASE");
        assert_eq!(
            label,
            Label::Passphrase(PassphraseDerivation::Digest(DigestType::Sha512))
        );
        assert_eq!(label.to_string(), "PASSPHRASE/SHA_512");
    }

    #[test]
    fn test_biometric_label_round_trips() {
        let label = Label::parse("BIOMETRIC/2024-01-01T00:00:00Z");
        let expected = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(label.created_at(), Some(expected));
        assert_eq!(label.to_string(), "BIOMETRIC/2024-01-01T00:00:00Z");
    }

    #[test]
    fn test_unparseable_labels_are_preserved() {
        for raw in [
            "BIOMETRIC/yesterday",
            "BIOMETRIC/2024-01-01T00:00:00.5Z",
            "PASSPHRASE/MD5",
            "PASSPHRASE/ARGON2ID:!!",
            "FIDO/abc",
            "",
        ] {
            let label = Label::parse(raw);
            assert_eq!(label, Label::Unknown(raw.to_string()), "{raw}");
            assert_eq!(label.to_string(), raw);
        }
    }

    #[test]
    fn test_argon2id_label_round_trips() {
        let label = Label::passphrase(PassphraseKdf::Argon2id).unwrap();
        let encoded = label.to_string();
        assert!(encoded.starts_with("PASSPHRASE/ARGON2ID:"));
        assert_eq!(Label::parse(&encoded), label);
    }

    #[test]
    fn test_passphrase_secret_is_digest() {
        let label = Label::passphrase(PassphraseKdf::Sha512).unwrap();
        let secret = label.passphrase_secret("correct").unwrap();
        assert_eq!(
            secret.as_slice(),
            DigestType::Sha512.digest(b"correct").unwrap().as_slice()
        );
    }

    #[test]
    fn test_biometric_label_has_no_passphrase_secret() {
        let label = Label::biometric_now();
        assert!(label.passphrase_secret("anything").is_err());
        assert!(!label.accepts_passphrase());
    }

    #[test]
    fn test_unknown_label_accepts_passphrase_attempts() {
        let label = Label::parse("FIDO/abc");
        assert!(label.accepts_passphrase());
        assert!(!label.is_passphrase());
        assert_eq!(label.passphrase_secret("x").unwrap().len(), 64);
    }

    #[test]
    fn test_key_wraps_and_unwraps_base_key() {
        let base_key = [7u8; 64];
        let cipher = Cipher::encryptor(b"unlock").unwrap();
        let key = Key::wrap(Label::biometric_now(), &cipher, &base_key).unwrap();

        let decryptor = key.content.decryptor(b"unlock").unwrap();
        assert_eq!(key.unwrap_base_key(&decryptor).unwrap().as_slice(), &base_key);
    }
}
