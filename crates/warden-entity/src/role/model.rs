//! Role entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Name of the distinguished role held by exactly one user.
pub const OWNER_ROLE_NAME: &str = "owner";

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: Uuid,
    /// Unique role name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// System roles cannot be deleted and their grants cannot be edited directly.
    pub is_system: bool,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Whether this is the owner role (matched case-insensitively).
    pub fn is_owner(&self) -> bool {
        self.name.eq_ignore_ascii_case(OWNER_ROLE_NAME)
    }
}

/// Data required to create a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRole {
    /// Role name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Whether the role is a system role.
    pub is_system: bool,
}

impl NewRole {
    /// The owner role as created by the bootstrap.
    pub fn owner() -> Self {
        Self {
            name: OWNER_ROLE_NAME.to_string(),
            description: "Full access; exactly one user holds this role".to_string(),
            is_system: true,
        }
    }
}
