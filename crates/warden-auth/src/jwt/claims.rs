//! Claims carried by every access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access token payload.
///
/// `scope` is a snapshot of the subject's permissions at issuance; it does
/// not follow later role changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: Uuid,
    /// Roles that contributed at least one permission to `scope`.
    pub role_ids: Vec<Uuid>,
    /// Permission codes, sorted and de-duplicated.
    pub scope: Vec<String>,
    /// Unique token ID.
    pub jti: Uuid,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    /// Whether the scope contains `code`.
    pub fn has_permission(&self, code: &str) -> bool {
        self.scope.iter().any(|c| c == code)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whole seconds until expiry, 0 once expired.
    pub fn remaining_ttl_seconds(&self) -> u64 {
        let remaining = self.exp - Utc::now().timestamp();
        remaining.max(0) as u64
    }
}
