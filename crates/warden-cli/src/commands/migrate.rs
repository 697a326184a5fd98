//! Database migration commands.

use clap::{Args, Subcommand};

use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_database::DatabasePool;

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply all pending migrations
    Run,
}

pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    let pool = DatabasePool::connect(&config.database).await?;

    match &args.command {
        MigrateCommand::Run => {
            warden_database::migration::run_migrations(pool.pool()).await?;
            output::print_success("All migrations applied.");
        }
    }

    pool.close().await;
    Ok(())
}
