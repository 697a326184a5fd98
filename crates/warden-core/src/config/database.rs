//! Store connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// PostgreSQL pool backing the identity store.
///
/// Session operations hold a connection for one short transaction, so a
/// small pool goes a long way. `acquire_timeout_seconds` should stay below
/// `auth.operation_timeout_seconds`, otherwise a starved pool surfaces as an
/// operation timeout instead of a pool error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connections kept open while idle.
    #[serde(default)]
    pub min_connections: u32,
    /// How long to wait for a free pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must be set"));
        }
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(AppError::configuration(format!(
                "database pool bounds are invalid (min {}, max {})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    3
}

fn default_idle_timeout() -> u64 {
    600
}
