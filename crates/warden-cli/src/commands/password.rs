//! Password utilities.

use clap::{Args, Subcommand};

use warden_auth::{PasswordHasher, PasswordValidator};
use warden_core::config::AppConfig;
use warden_core::error::AppError;

use super::prompt_password;
use crate::output;

/// Arguments for password commands
#[derive(Debug, Args)]
pub struct PasswordArgs {
    #[command(subcommand)]
    pub command: PasswordCommand,
}

/// Password subcommands
#[derive(Debug, Subcommand)]
pub enum PasswordCommand {
    /// Print the Argon2id hash of a password read from the prompt
    Hash,
    /// Check a password against the configured policy
    Check,
}

pub fn execute(args: &PasswordArgs, config: &AppConfig) -> Result<(), AppError> {
    let password = prompt_password(&None, "Password")?;
    let validator = PasswordValidator::new(&config.auth);

    match &args.command {
        PasswordCommand::Hash => {
            if let Err(e) = validator.validate(&password) {
                output::print_warning(&e.message);
            }
            let hash = PasswordHasher::new(&config.auth)?.hash_password(&password)?;
            println!("{hash}");
        }
        PasswordCommand::Check => {
            validator.validate(&password)?;
            output::print_success("Password satisfies the policy.");
        }
    }

    Ok(())
}
