//! Argon2id password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use tracing::warn;

use warden_core::config::AuthConfig;
use warden_core::error::AppError;

/// Derived key length in bytes.
const OUTPUT_LEN: usize = 32;

/// Hashes and verifies passwords with Argon2id.
///
/// New hashes use the configured cost parameters. Verification reads the
/// parameters embedded in the stored PHC string, so hashes produced under
/// older settings keep verifying.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a random throwaway secret, verified against when no stored
    /// hash exists so unknown accounts cost the same as wrong passwords.
    decoy_hash: String,
}

impl PasswordHasher {
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            Some(OUTPUT_LEN),
        )
        .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;

        let mut hasher = Self {
            params,
            decoy_hash: String::new(),
        };
        let decoy = SaltString::generate(&mut OsRng);
        hasher.decoy_hash = hasher.hash_password(decoy.as_str())?;
        Ok(hasher)
    }

    /// Hash a plaintext password with a random 16-byte salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify `password` against a stored PHC hash in constant time.
    ///
    /// A stored hash that cannot be parsed verifies as `false`.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(e) => {
                warn!(error = %e, "Password verification failed");
                false
            }
        }
    }

    /// Run a full verification that always fails. Used on the unknown-account
    /// path of login.
    pub fn verify_decoy(&self, password: &str) -> bool {
        self.verify_password(password, &self.decoy_hash)
    }
}
