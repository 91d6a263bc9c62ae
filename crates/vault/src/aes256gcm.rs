//! AES-256-GCM implementation of the [`Cipher`] trait.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};

use crate::{error::VaultError, traits::Cipher};

/// Nonce size for AES-GCM (96 bits).
pub const NONCE_LEN: usize = 12;

/// Poly-style GCM authentication tag size.
pub const TAG_LEN: usize = 16;

/// AES-256-GCM AEAD cipher.
pub struct Aes256GcmCipher;

impl Cipher for Aes256GcmCipher {
    fn nonce_len(&self) -> usize {
        NONCE_LEN
    }

    fn tag_len(&self) -> usize {
        TAG_LEN
    }

    fn seal(
        &self,
        key: &[u8; 32],
        nonce: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), VaultError> {
        if nonce.len() != NONCE_LEN {
            return Err(VaultError::Cipher(format!(
                "invalid nonce length: {}",
                nonce.len()
            )));
        }

        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|e| VaultError::Cipher(e.to_string()))?;

        // aes-gcm appends the tag to the ciphertext; split it back out so the
        // vault can lay the blob out as salt || nonce || tag || ciphertext.
        let mut sealed = cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|e| VaultError::Cipher(e.to_string()))?;
        let tag = sealed.split_off(sealed.len() - TAG_LEN);
        Ok((tag, sealed))
    }

    fn open(
        &self,
        key: &[u8; 32],
        nonce: &[u8],
        tag: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, VaultError> {
        if nonce.len() != NONCE_LEN || tag.len() != TAG_LEN {
            return Err(VaultError::Malformed("bad nonce or tag length".into()));
        }

        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|e| VaultError::Cipher(e.to_string()))?;

        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        cipher
            .decrypt(Nonce::from_slice(nonce), sealed.as_slice())
            .map_err(|_| VaultError::Decryption)
    }
}
