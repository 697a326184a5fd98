//! Opaque refresh secrets.
//!
//! The secret is the bearer credential handed to the client. Only its
//! SHA-256 digest is stored. A fast digest is enough here: 48 random bytes
//! cannot be brute-forced, unlike a password.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Random bytes per secret.
pub const REFRESH_SECRET_BYTES: usize = 48;

/// Generate a new URL-safe refresh secret from the OS CSPRNG.
pub fn generate_refresh_secret() -> String {
    let mut bytes = [0u8; REFRESH_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Lower-case hex SHA-256 of the secret; the storage and lookup key.
pub fn hash_refresh_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}
