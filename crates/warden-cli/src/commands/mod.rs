//! CLI command definitions and dispatch.

pub mod migrate;
pub mod owner;
pub mod password;
pub mod role;
pub mod token;
pub mod user;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use warden_auth::{JwtDecoder, PasswordHasher, PasswordValidator, PermissionEnforcer};
use warden_core::config::AppConfig;
use warden_core::error::AppError;
use warden_database::{DatabasePool, IdentityStore, PgIdentityStore};
use warden_service::{RoleService, UserAdminService};

use crate::output::OutputFormat;

/// Warden identity and access-control administration
#[derive(Debug, Parser)]
#[command(name = "warden", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from `config/{env}.toml`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Owner account bootstrap
    Owner(owner::OwnerArgs),
    /// User management
    User(user::UserArgs),
    /// Role and permission management
    Role(role::RoleArgs),
    /// Password utilities
    Password(password::PasswordArgs),
    /// Access token utilities
    Token(token::TokenArgs),
}

impl Cli {
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load(&self.config, &self.env)
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Owner(args) => owner::execute(args, config, self.format).await,
            Commands::User(args) => user::execute(args, config, self.format).await,
            Commands::Role(args) => role::execute(args, config, self.format).await,
            Commands::Password(args) => password::execute(args, config),
            Commands::Token(args) => token::execute(args, config, self.format),
        }
    }
}

/// Everything a database-backed command needs, wired from configuration.
pub struct Backend {
    pub pool: DatabasePool,
    pub store: Arc<dyn IdentityStore>,
    pub hasher: PasswordHasher,
    pub validator: PasswordValidator,
    pub users: UserAdminService,
    pub roles: RoleService,
}

impl Backend {
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let pool = DatabasePool::connect(&config.database).await?;
        let store: Arc<dyn IdentityStore> = Arc::new(PgIdentityStore::new(pool.pool().clone()));
        let hasher = PasswordHasher::new(&config.auth)?;
        let validator = PasswordValidator::new(&config.auth);
        let enforcer = Arc::new(PermissionEnforcer::new(JwtDecoder::new(&config.auth)));

        let users = UserAdminService::new(
            store.clone(),
            Arc::new(hasher.clone()),
            Arc::new(validator.clone()),
            enforcer.clone(),
        );
        let roles = RoleService::new(store.clone(), enforcer);

        Ok(Self {
            pool,
            store,
            hasher,
            validator,
            users,
            roles,
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Read a value interactively when it was not given on the command line.
pub fn prompt_text(value: &Option<String>, prompt: &str) -> Result<String, AppError> {
    match value {
        Some(v) => Ok(v.clone()),
        None => dialoguer::Input::new()
            .with_prompt(prompt)
            .interact_text()
            .map_err(|e| AppError::internal(format!("Input error: {e}"))),
    }
}

/// Read a password interactively, with confirmation.
pub fn prompt_password(value: &Option<String>, prompt: &str) -> Result<String, AppError> {
    match value {
        Some(v) => Ok(v.clone()),
        None => dialoguer::Password::new()
            .with_prompt(prompt)
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}"))),
    }
}
