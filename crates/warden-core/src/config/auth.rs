//! Authentication configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Token, credential, and session timing configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for access-token signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Upper bound for any access token TTL, in minutes.
    ///
    /// Access tokens stay valid until expiry even if the user is disabled,
    /// so this ceiling bounds that staleness window.
    #[serde(default = "default_max_access_ttl")]
    pub max_access_token_ttl_minutes: u64,
    /// Clock-skew leeway applied when checking `exp`, in seconds.
    #[serde(default = "default_leeway")]
    pub token_leeway_seconds: u64,
    /// Refresh token TTL in hours.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_hours: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    /// Argon2 lane count.
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
    /// Deadline for a single session operation, in seconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_seconds: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .field(
                "max_access_token_ttl_minutes",
                &self.max_access_token_ttl_minutes,
            )
            .field("token_leeway_seconds", &self.token_leeway_seconds)
            .field("refresh_token_ttl_hours", &self.refresh_token_ttl_hours)
            .field("password_min_length", &self.password_min_length)
            .field("operation_timeout_seconds", &self.operation_timeout_seconds)
            .finish_non_exhaustive()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_ttl_minutes: default_access_ttl(),
            max_access_token_ttl_minutes: default_max_access_ttl(),
            token_leeway_seconds: default_leeway(),
            refresh_token_ttl_hours: default_refresh_ttl(),
            password_min_length: default_password_min(),
            argon2_memory_kib: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
            operation_timeout_seconds: default_operation_timeout(),
        }
    }
}

impl AuthConfig {
    /// Access token lifetime.
    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_ttl_minutes * 60)
    }

    /// Ceiling for access token lifetimes.
    pub fn max_access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.max_access_token_ttl_minutes * 60)
    }

    /// Refresh token lifetime.
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_ttl_hours * 3600)
    }

    /// Deadline applied to each session operation.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }

    /// Rejects settings that would make issued credentials unusable or unbounded.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt_secret.is_empty() {
            return Err(AppError::configuration("jwt_secret must not be empty"));
        }
        if self.access_token_ttl_minutes == 0 || self.refresh_token_ttl_hours == 0 {
            return Err(AppError::configuration("token TTLs must be greater than zero"));
        }
        if self.access_token_ttl_minutes > self.max_access_token_ttl_minutes {
            return Err(AppError::configuration(format!(
                "access_token_ttl_minutes ({}) exceeds max_access_token_ttl_minutes ({})",
                self.access_token_ttl_minutes, self.max_access_token_ttl_minutes
            )));
        }
        if self.operation_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "operation_timeout_seconds must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_jwt_secret() -> String {
    "change-me-jwt-secret".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_max_access_ttl() -> u64 {
    60
}

fn default_leeway() -> u64 {
    5
}

fn default_refresh_ttl() -> u64 {
    720
}

fn default_password_min() -> usize {
    8
}

fn default_argon2_memory() -> u32 {
    64 * 1024
}

fn default_argon2_iterations() -> u32 {
    1
}

fn default_argon2_parallelism() -> u32 {
    4
}

fn default_operation_timeout() -> u64 {
    10
}
