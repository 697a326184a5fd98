//! Who is performing a management operation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use warden_auth::{Claims, PermissionEnforcer};
use warden_core::result::AppResult;
use warden_entity::ClientMeta;

/// Context for one management call.
///
/// Requests from the transport layer carry the caller's verified access
/// token claims. Operator tooling with direct store access carries none and
/// is not scope-checked.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Verified claims of the caller; `None` for the operator.
    pub claims: Option<Claims>,
    /// Transport metadata of the request.
    pub client: ClientMeta,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// A request made by an authenticated user.
    pub fn for_user(claims: Claims, client: ClientMeta) -> Self {
        Self {
            claims: Some(claims),
            client,
            request_time: Utc::now(),
        }
    }

    /// A request made by the operator CLI.
    pub fn operator() -> Self {
        Self {
            claims: None,
            client: ClientMeta::default(),
            request_time: Utc::now(),
        }
    }

    /// The acting user, if any.
    pub fn actor_id(&self) -> Option<Uuid> {
        self.claims.as_ref().map(Claims::user_id)
    }

    /// Whether the call comes from operator tooling.
    pub fn is_operator(&self) -> bool {
        self.claims.is_none()
    }

    /// Require `code` in the caller's scope. Operator calls always pass.
    pub fn authorize(&self, enforcer: &PermissionEnforcer, code: &str) -> AppResult<()> {
        match &self.claims {
            Some(claims) => enforcer.require_permission(claims, code),
            None => Ok(()),
        }
    }
}
