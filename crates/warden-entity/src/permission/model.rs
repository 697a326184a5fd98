//! Permission reference data.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An immutable permission such as `users:read`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct Permission {
    /// Unique permission identifier.
    pub id: Uuid,
    /// Canonical `resource:action` code.
    pub code: String,
    /// The resource this permission applies to.
    pub resource: String,
    /// The action it allows.
    pub action: String,
}

impl Permission {
    /// Builds the canonical code for a resource/action pair.
    pub fn code_for(resource: &str, action: &str) -> String {
        format!("{resource}:{action}")
    }
}

/// One role→permission grant row, as produced by the user→role→permission join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PermissionGrant {
    /// The granting role.
    pub role_id: Uuid,
    /// The granted permission.
    #[sqlx(flatten)]
    pub permission: Permission,
}
