//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files layered with `WARDEN__`-prefixed environment variables. Each
//! sub-module represents a logical configuration section.

pub mod auth;
pub mod database;
pub mod logging;
pub mod owner;

use serde::{Deserialize, Serialize};

pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::owner::OwnerConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Token and credential settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Owner account created by the cold-start bootstrap.
    #[serde(default)]
    pub owner: OwnerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a base TOML file.
    ///
    /// Merges `path`, an optional `config/{env}.toml` overlay, and
    /// environment variables such as `WARDEN__AUTH__JWT_SECRET`.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("WARDEN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field constraints of every section.
    pub fn validate(&self) -> Result<(), AppError> {
        self.database.validate()?;
        self.auth.validate()?;
        self.owner.validate()?;
        Ok(())
    }
}
