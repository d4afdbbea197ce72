//! Hash algorithms named on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha512};

use crate::error::CryptoError;

/// Digest algorithm used for content integrity and passphrase hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DigestType {
    Sha1,
    Sha512,
    /// A name written by a newer client.
    Other(String),
}

impl DigestType {
    pub fn as_str(&self) -> &str {
        match self {
            DigestType::Sha1 => "SHA_1",
            DigestType::Sha512 => "SHA_512",
            DigestType::Other(name) => name,
        }
    }

    /// Parse a known digest name; unknown names yield `None`.
    pub fn parse_known(value: &str) -> Option<Self> {
        match value {
            "SHA_1" => Some(DigestType::Sha1),
            "SHA_512" => Some(DigestType::Sha512),
            _ => None,
        }
    }

    pub fn digest(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            DigestType::Sha1 => Ok(Sha1::digest(data).to_vec()),
            DigestType::Sha512 => Ok(Sha512::digest(data).to_vec()),
            DigestType::Other(name) => Err(CryptoError::UnsupportedAlgorithm(name.clone())),
        }
    }
}

impl From<String> for DigestType {
    fn from(value: String) -> Self {
        DigestType::parse_known(&value).unwrap_or(DigestType::Other(value))
    }
}

impl From<DigestType> for String {
    fn from(value: DigestType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DigestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
