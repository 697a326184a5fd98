//! Owner bootstrap configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The account that the cold-start bootstrap makes the sole owner.
#[derive(Clone, Serialize, Deserialize)]
pub struct OwnerConfig {
    /// Login email of the owner account.
    #[serde(default = "default_email")]
    pub email: String,
    /// Initial plaintext password; only used when the account is created.
    #[serde(default = "default_password")]
    pub password: String,
    /// Display name of the owner account.
    #[serde(default = "default_full_name")]
    pub full_name: String,
}

impl std::fmt::Debug for OwnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerConfig")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            email: default_email(),
            password: default_password(),
            full_name: default_full_name(),
        }
    }
}

impl OwnerConfig {
    /// Rejects empty bootstrap values.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::configuration(
                "owner bootstrap values must not be empty",
            ));
        }
        Ok(())
    }
}

fn default_email() -> String {
    "owner@example.com".to_string()
}

fn default_password() -> String {
    "ChangeMe123!".to_string()
}

fn default_full_name() -> String {
    "Owner".to_string()
}
