//! Encryption-at-rest for third-party credentials.
//!
//! OAuth tokens are never written to the database in plaintext. Each value
//! is encrypted under a key derived from the process-wide encryption secret
//! and a per-call random salt (PBKDF2-HMAC-SHA512), then sealed with an
//! AEAD cipher. Trait-based [`Cipher`] design allows swapping the backend.

pub mod aes256gcm;
pub mod error;
pub mod kdf;
pub mod traits;
pub mod vault;

pub use {
    aes256gcm::Aes256GcmCipher,
    error::VaultError,
    traits::Cipher,
    vault::{CredentialVault, is_encrypted},
};
