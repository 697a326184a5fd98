//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::UserStatus;
use crate::role::Role;

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Login email, stored lower-cased.
    pub email: String,
    /// Argon2id password hash in PHC format.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Human-readable display name.
    pub full_name: String,
    /// Account status.
    pub status: UserStatus,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the user can log in right now.
    pub fn can_login(&self) -> bool {
        self.status.can_login() && self.deleted_at.is_none()
    }

    /// Check whether the account was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Login email; normalized before it is written.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Display name.
    pub full_name: String,
    /// Initial status.
    pub status: UserStatus,
}

impl NewUser {
    /// Returns a copy with the email normalized for storage.
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }
}

/// A user together with the roles currently assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// The user record.
    #[serde(flatten)]
    pub user: User,
    /// Assigned roles, ordered by name.
    pub roles: Vec<Role>,
}

impl UserProfile {
    /// Whether any assigned role is the owner role.
    pub fn is_owner(&self) -> bool {
        self.roles.iter().any(Role::is_owner)
    }
}

/// Emails are case-insensitive: trim and lower-case before any write or lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
