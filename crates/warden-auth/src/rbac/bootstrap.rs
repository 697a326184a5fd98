//! Cold-start owner bootstrap.
//!
//! Safe to run at every start: each step inserts only what is missing, so
//! once the store has converged a run changes nothing.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use warden_core::config::OwnerConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::IdentityStore;
use warden_entity::{NewRole, NewUser, UserStatus};

use crate::password::{PasswordHasher, PasswordValidator};

/// What a bootstrap run found and changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub role_id: Uuid,
    pub user_id: Uuid,
    /// The owner account did not exist and was created.
    pub user_created: bool,
    /// Number of permission grants added to the owner role.
    pub permissions_granted: u64,
    /// The owner role was newly assigned to the account.
    pub role_assigned: bool,
}

/// Establishes the owner role, its grants, and the configured owner account.
#[derive(Clone)]
pub struct OwnerBootstrap {
    store: Arc<dyn IdentityStore>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
}

impl std::fmt::Debug for OwnerBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnerBootstrap").finish_non_exhaustive()
    }
}

impl OwnerBootstrap {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: PasswordHasher,
        validator: PasswordValidator,
    ) -> Self {
        Self {
            store,
            hasher,
            validator,
        }
    }

    /// Run the bootstrap in a single transaction.
    ///
    /// The owner role always receives every known permission. If a different
    /// user already holds the owner role, the configured account is left
    /// without it so the single-owner invariant holds.
    pub async fn run(&self, owner: &OwnerConfig) -> AppResult<BootstrapReport> {
        let mut tx = self.store.begin().await?;

        let role = tx.insert_role_if_absent(&NewRole::owner()).await?;
        let role = tx
            .find_role_by_name_for_update(&role.name)
            .await?
            .ok_or_else(|| AppError::internal("Owner role vanished during bootstrap"))?;

        let permissions_granted = tx.grant_all_permissions(role.id).await?;
        if permissions_granted > 0 {
            info!(role_id = %role.id, granted = permissions_granted, "Granted permissions to owner role");
        }

        let (user, user_created) = match tx.find_user_by_email_any(&owner.email).await? {
            Some(user) if !user.can_login() => {
                warn!(user_id = %user.id, status = %user.status, "Configured owner account is not active");
                return Err(AppError::invariant_violation(format!(
                    "Configured owner account {} is {}; the owner must be active",
                    user.email, user.status
                )));
            }
            Some(user) => (user, false),
            None => {
                if let Err(e) = self.validator.validate(&owner.password) {
                    warn!(reason = %e.message, "Configured owner password does not meet the password policy");
                }
                let user = tx
                    .insert_user(&NewUser {
                        email: owner.email.clone(),
                        password_hash: self.hasher.hash_password(&owner.password)?,
                        full_name: owner.full_name.clone(),
                        status: UserStatus::Active,
                    })
                    .await?;
                info!(user_id = %user.id, email = %user.email, "Created owner account");
                (user, true)
            }
        };

        let other_owners = tx.count_role_holders_except(role.id, user.id).await?;
        let role_assigned = if other_owners > 0 {
            warn!(
                user_id = %user.id,
                other_owners,
                "Owner role is held by another user; not assigning it to the configured account"
            );
            false
        } else {
            tx.assign_role_if_absent(user.id, role.id).await?
        };

        tx.commit().await?;

        info!(
            user_id = %user.id,
            role_id = %role.id,
            user_created,
            role_assigned,
            "Owner bootstrap complete"
        );

        Ok(BootstrapReport {
            role_id: role.id,
            user_id: user.id,
            user_created,
            permissions_granted,
            role_assigned,
        })
    }
}
