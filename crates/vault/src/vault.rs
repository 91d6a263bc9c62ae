//! Credential vault: encrypt/decrypt opaque secret strings for storage.

use {base64::Engine, zeroize::Zeroizing};

use crate::{
    aes256gcm::Aes256GcmCipher,
    error::VaultError,
    kdf::{self, SALT_LEN},
    traits::Cipher,
};

/// Minimum decoded blob length: salt + nonce + tag + at least one
/// ciphertext byte. Used by the [`is_encrypted`] heuristic.
const MIN_BLOB_LEN: usize = SALT_LEN + 12 + 16 + 1;

/// Encrypts credentials under a process-wide secret.
///
/// Every call to [`encrypt`](CredentialVault::encrypt) uses a fresh random
/// salt and nonce, so the same plaintext never produces the same blob
/// twice. Blob layout: `base64(salt || nonce || tag || ciphertext)`.
pub struct CredentialVault<C: Cipher = Aes256GcmCipher> {
    secret: Zeroizing<Vec<u8>>,
    cipher: C,
}

impl CredentialVault<Aes256GcmCipher> {
    /// Create a vault with the default AES-256-GCM cipher.
    ///
    /// Fails with [`VaultError::MissingSecret`] when the secret is empty —
    /// callers construct the vault at startup so this is a fail-fast check.
    pub fn new(secret: &str) -> Result<Self, VaultError> {
        Self::with_cipher(secret, Aes256GcmCipher)
    }
}

impl<C: Cipher> CredentialVault<C> {
    /// Create a vault with a custom cipher backend.
    pub fn with_cipher(secret: &str, cipher: C) -> Result<Self, VaultError> {
        if secret.trim().is_empty() {
            return Err(VaultError::MissingSecret);
        }
        Ok(Self {
            secret: Zeroizing::new(secret.as_bytes().to_vec()),
            cipher,
        })
    }

    /// Encrypt a plaintext secret into a transport-safe blob.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        use rand::RngCore;

        let salt = kdf::generate_salt();
        let key = kdf::derive_key(&self.secret, &salt);

        let mut nonce = vec![0u8; self.cipher.nonce_len()];
        rand::rng().fill_bytes(&mut nonce);

        let (tag, ciphertext) = self.cipher.seal(&key, &nonce, plaintext.as_bytes())?;

        let mut blob = Vec::with_capacity(SALT_LEN + nonce.len() + tag.len() + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&tag);
        blob.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(blob))
    }

    /// Decrypt a blob previously produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, blob: &str) -> Result<String, VaultError> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(blob)
            .map_err(|e| VaultError::Malformed(e.to_string()))?;

        let nonce_len = self.cipher.nonce_len();
        let tag_len = self.cipher.tag_len();
        if decoded.len() < SALT_LEN + nonce_len + tag_len {
            return Err(VaultError::Malformed("blob too short".into()));
        }

        let (salt, rest) = decoded.split_at(SALT_LEN);
        let (nonce, rest) = rest.split_at(nonce_len);
        let (tag, ciphertext) = rest.split_at(tag_len);

        let key = kdf::derive_key(&self.secret, salt);
        let plaintext = self.cipher.open(&key, nonce, tag, ciphertext)?;
        String::from_utf8(plaintext).map_err(|_| VaultError::Decryption)
    }
}

/// Heuristic check for whether a stored value looks like a vault blob.
///
/// Used to tell already-encrypted values apart from legacy plaintext rows
/// during migration. Not a correctness guarantee — a long base64 string
/// passes even if it was never produced by the vault.
pub fn is_encrypted(value: &str) -> bool {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map(|decoded| decoded.len() >= MIN_BLOB_LEN)
        .unwrap_or(false)
}
