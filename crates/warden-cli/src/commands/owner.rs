//! Owner bootstrap command.

use clap::{Args, Subcommand};

use warden_auth::OwnerBootstrap;
use warden_core::config::AppConfig;
use warden_core::error::AppError;

use super::Backend;
use crate::output::{self, OutputFormat};

/// Arguments for owner commands
#[derive(Debug, Args)]
pub struct OwnerArgs {
    #[command(subcommand)]
    pub command: OwnerCommand,
}

/// Owner subcommands
#[derive(Debug, Subcommand)]
pub enum OwnerCommand {
    /// Ensure the owner role, its grants, and the configured owner account exist
    Bootstrap,
}

pub async fn execute(
    args: &OwnerArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let backend = Backend::connect(config).await?;

    match &args.command {
        OwnerCommand::Bootstrap => {
            let report = OwnerBootstrap::new(
                backend.store.clone(),
                backend.hasher.clone(),
                backend.validator.clone(),
            )
            .run(&config.owner)
            .await?;

            if !report.role_assigned && report.user_created {
                output::print_warning(
                    "Another user already holds the owner role; the configured account was created without it",
                );
            }
            output::print_record(
                &report,
                &[
                    ("Owner email", config.owner.email.clone()),
                    ("User ID", report.user_id.to_string()),
                    ("Role ID", report.role_id.to_string()),
                    ("User created", report.user_created.to_string()),
                    ("Role assigned", report.role_assigned.to_string()),
                    ("Permissions granted", report.permissions_granted.to_string()),
                ],
                format,
            )?;
        }
    }

    backend.close().await;
    Ok(())
}
