//! Single-owner invariant checks.
//!
//! Every check runs inside the transaction that performs the write it
//! gates, and locks the owner role row first so concurrent owner mutations
//! serialise.

use std::collections::BTreeSet;

use tracing::warn;
use uuid::Uuid;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::StoreTransaction;
use warden_entity::{OWNER_ROLE_NAME, Role, UserStatus};

/// Rejects role or status changes that would leave zero or several owners.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerGuard;

impl OwnerGuard {
    pub fn new() -> Self {
        Self
    }

    /// Validate that giving `user_id` exactly `proposed_role_ids` keeps one owner.
    ///
    /// Returns the proposed roles. Unknown role ids are `NotFound`.
    pub async fn validate_owner_assignment(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        proposed_role_ids: &[Uuid],
    ) -> AppResult<Vec<Role>> {
        let requested: BTreeSet<Uuid> = proposed_role_ids.iter().copied().collect();
        let requested: Vec<Uuid> = requested.into_iter().collect();
        let roles = tx.find_roles_by_ids(&requested).await?;
        if let Some(missing) = requested
            .iter()
            .find(|id| !roles.iter().any(|r| r.id == **id))
        {
            return Err(AppError::not_found(format!("Role {missing} not found")));
        }

        let Some(owner) = tx.find_role_by_name_for_update(OWNER_ROLE_NAME).await? else {
            return Ok(roles);
        };

        let proposes_owner = roles.iter().any(|r| r.id == owner.id);
        let other_owners = tx.count_role_holders_except(owner.id, user_id).await?;

        if proposes_owner && other_owners > 0 {
            warn!(user_id = %user_id, "Rejected owner assignment: another user holds the owner role");
            return Err(AppError::invariant_violation(
                "Only one user can hold the owner role",
            ));
        }

        if !proposes_owner && other_owners == 0 && tx.user_has_role(user_id, owner.id).await? {
            warn!(user_id = %user_id, "Rejected owner removal: user is the sole owner");
            return Err(AppError::invariant_violation(
                "At least one owner is required",
            ));
        }

        Ok(roles)
    }

    /// Validate that moving `user_id` to `status` keeps an active owner.
    pub async fn validate_owner_status(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        status: UserStatus,
    ) -> AppResult<()> {
        if status == UserStatus::Active {
            return Ok(());
        }
        let Some(owner) = tx.find_role_by_name_for_update(OWNER_ROLE_NAME).await? else {
            return Ok(());
        };
        if tx.user_has_role(user_id, owner.id).await? {
            warn!(user_id = %user_id, status = %status, "Rejected status change of the owner");
            return Err(AppError::invariant_violation(format!(
                "The owner account cannot be {status}"
            )));
        }
        Ok(())
    }
}
