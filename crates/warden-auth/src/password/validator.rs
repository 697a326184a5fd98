//! Password policy for new passwords.

use warden_core::config::AuthConfig;
use warden_core::error::AppError;

/// Checks new passwords against length, character-class and strength rules.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
}

impl PasswordValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Returns the first violated rule as a `Validation` error.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        let rules: [(fn(char) -> bool, &str); 4] = [
            (char::is_uppercase, "an uppercase letter"),
            (char::is_lowercase, "a lowercase letter"),
            (|c| c.is_ascii_digit(), "a digit"),
            (|c| !c.is_alphanumeric(), "a special character"),
        ];
        for (matches, what) in rules {
            if !password.chars().any(matches) {
                return Err(AppError::validation(format!(
                    "Password must contain at least {what}"
                )));
            }
        }

        let estimate = zxcvbn::zxcvbn(password, &[]);
        if estimate.score() < zxcvbn::Score::Three {
            return Err(AppError::validation(
                "Password is too easy to guess; use a longer or less predictable one",
            ));
        }

        Ok(())
    }
}
