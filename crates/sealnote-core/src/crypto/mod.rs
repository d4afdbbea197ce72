//! Cryptographic envelope primitives.
//!
//! A document body is encrypted under a random 64-byte base key, and the base
//! key is wrapped once per unlock method:
//! - **Content**: AES-128-CBC ciphertext plus a SHA-1 digest of the plaintext
//! - **Key**: a [`Label`] naming the unlock method plus the wrapped base key
//! - **Argon2id**: optional passphrase stretching for new passphrase keys
//!
//! ## Security Model
//!
//! - Content integrity is checked by digest, compared in constant time
//! - Key material is zeroized from memory on drop and redacted in `Debug`
//! - Legacy v1 key derivation (truncate to block size, SHA-512 passphrase
//!   digest) stays the default for compatibility with existing documents
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of a stored document from any backend
//!
//! We do NOT defend against:
//! - Compromised OS / keyring
//! - Offline brute-force of weak passphrases under the legacy derivation

pub mod cipher;
pub mod content;
pub mod digest;
pub mod kdf;
pub mod key;
pub mod passphrase;
pub mod secure_key;

pub use cipher::{Cipher, CipherType, Direction, BLOCK_SIZE};
pub use content::Content;
pub use digest::DigestType;
pub use kdf::{derive_key, DerivedKey};
pub use key::{Key, Label, PassphraseDerivation, PassphraseKdf};
pub use passphrase::validate_passphrase;
pub use secure_key::{KeyHandle, SecureKeyStore};
