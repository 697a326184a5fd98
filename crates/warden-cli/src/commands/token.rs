//! Access token inspection.

use clap::{Args, Subcommand};

use warden_auth::JwtDecoder;
use warden_core::config::AppConfig;
use warden_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Verify an access token with the configured secret and print its claims
    Inspect {
        /// The encoded JWT
        token: String,
    },
}

pub fn execute(args: &TokenArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        TokenCommand::Inspect { token } => {
            let claims = JwtDecoder::new(&config.auth).parse_access_token(token.trim())?;
            output::print_record(
                &claims,
                &[
                    ("Subject", claims.sub.to_string()),
                    ("Token ID", claims.jti.to_string()),
                    ("Expires", claims.expires_at().to_rfc3339()),
                    ("Remaining (s)", claims.remaining_ttl_seconds().to_string()),
                    ("Roles", claims.role_ids.len().to_string()),
                    ("Scope", claims.scope.join(" ")),
                ],
                format,
            )?;
        }
    }
    Ok(())
}
