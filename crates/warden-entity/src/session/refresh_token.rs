//! Refresh token record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted refresh credential.
///
/// Only the SHA-256 digest of the secret is stored. Records are created on
/// login and on every rotation; a record is terminated by setting
/// `revoked_at`, which is never cleared again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RefreshTokenRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// The user this credential belongs to.
    pub user_id: Uuid,
    /// Rotation chain this record belongs to; shared by every descendant of one login.
    pub family_id: Uuid,
    /// Hex SHA-256 digest of the secret.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    /// When the record was revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// The record that replaced this one on rotation.
    pub replaced_by_token_id: Option<Uuid>,
    /// Client address at issuance.
    pub created_by_ip: Option<String>,
    /// Client descriptor at issuance.
    pub user_agent: Option<String>,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a refresh record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTokenState {
    /// Usable for exactly one rotation.
    Active,
    /// Terminal; rotated away, logged out, or revoked with its family.
    Revoked,
    /// Past `expires_at`; computed, never stored.
    Expired,
}

impl RefreshTokenRecord {
    /// Whether the record has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Whether the record is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Computes the state at `now`. Revocation takes precedence over expiry.
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.is_revoked() {
            RefreshTokenState::Revoked
        } else if self.is_expired_at(now) {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }
}

/// Data required to persist a new refresh record.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub client: ClientMeta,
}

/// Issuance metadata supplied by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    /// Client address.
    pub ip: Option<String>,
    /// Client descriptor, usually the User-Agent header.
    pub user_agent: Option<String>,
}

impl ClientMeta {
    /// Builds metadata from optional transport values, dropping blanks.
    pub fn new(ip: Option<&str>, user_agent: Option<&str>) -> Self {
        let keep = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        Self {
            ip: keep(ip),
            user_agent: keep(user_agent),
        }
    }
}
