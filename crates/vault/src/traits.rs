//! Cipher trait for swappable authenticated encryption backends.

use crate::error::VaultError;

/// Trait for authenticated encryption (AEAD).
///
/// Implementations can be swapped without changing the blob layout the
/// vault produces: the vault owns `salt || nonce || tag || ciphertext`
/// assembly, the cipher only seals and opens.
pub trait Cipher: Send + Sync {
    /// Nonce length in bytes expected by [`seal`](Self::seal).
    fn nonce_len(&self) -> usize;

    /// Authentication tag length in bytes.
    fn tag_len(&self) -> usize;

    /// Encrypt `plaintext` under `key` and `nonce`.
    ///
    /// Returns `(tag, ciphertext)`.
    fn seal(
        &self,
        key: &[u8; 32],
        nonce: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), VaultError>;

    /// Decrypt a `(tag, ciphertext)` pair previously produced by
    /// [`seal`](Self::seal). Fails if the tag does not verify.
    fn open(
        &self,
        key: &[u8; 32],
        nonce: &[u8],
        tag: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, VaultError>;
}
