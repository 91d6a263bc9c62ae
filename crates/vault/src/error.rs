//! Vault error types.

/// Errors produced by credential vault operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The process-wide encryption secret is empty or unset.
    ///
    /// Checked when the vault is constructed so a misconfigured deployment
    /// fails at startup instead of on the first credential write.
    #[error("encryption secret is not configured")]
    MissingSecret,

    /// The blob is not valid base64 or is too short to contain
    /// `salt || nonce || tag || ciphertext`.
    #[error("malformed credential blob: {0}")]
    Malformed(String),

    /// Authentication tag verification failed — the blob was tampered with,
    /// corrupted, or encrypted under a different secret. The stored
    /// credential must be treated as invalid and the account reconnected.
    #[error("credential decryption failed")]
    Decryption,

    /// The cipher backend rejected the operation.
    #[error("cipher error: {0}")]
    Cipher(String),
}
