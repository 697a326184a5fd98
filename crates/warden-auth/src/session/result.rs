//! Values handed to the transport layer after login or refresh.

use chrono::{DateTime, Utc};
use serde::Serialize;

use warden_entity::UserProfile;

use crate::jwt::AccessToken;

/// Outcome of a successful login or refresh.
///
/// `refresh_token` is the raw secret. The transport layer delivers it in a
/// non-script-readable, path-scoped cookie and must never log it.
#[derive(Clone, Serialize)]
pub struct SessionResult {
    pub access_token: String,
    /// Whole seconds the access token remains valid, measured when this value was built.
    pub expires_in: i64,
    /// Permission codes embedded in the access token.
    pub scope: Vec<String>,
    pub user: UserProfile,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    /// Expiry of the refresh record; lets the transport layer size the cookie.
    pub refresh_expires_at: DateTime<Utc>,
}

impl SessionResult {
    pub(crate) fn new(
        access: AccessToken,
        scope: Vec<String>,
        user: UserProfile,
        refresh_token: String,
        refresh_expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            expires_in: access.expires_in(),
            access_token: access.token,
            scope,
            user,
            refresh_token,
            refresh_expires_at,
        }
    }
}

impl std::fmt::Debug for SessionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResult")
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("user_id", &self.user.user.id)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish_non_exhaustive()
    }
}
