//! PBKDF2-HMAC-SHA512 key derivation for secret → content key.

use {pbkdf2::pbkdf2_hmac, sha2::Sha512, zeroize::Zeroizing};

/// Iteration count for PBKDF2. Slow by design.
pub const ITERATIONS: u32 = 100_000;

/// Salt length in bytes. A fresh salt is generated for every encryption.
pub const SALT_LEN: usize = 16;

/// Derive a 256-bit key from the process secret and a per-blob salt.
pub fn derive_key(secret: &[u8], salt: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut output = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha512>(secret, salt, ITERATIONS, output.as_mut());
    output
}

/// Generate a random salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    use rand::RngCore;

    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
