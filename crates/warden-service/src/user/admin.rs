//! Admin user management: creation, role assignment and status changes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use warden_auth::{OwnerGuard, PasswordHasher, PasswordValidator, PermissionEnforcer};
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::{IdentityStore, StoreTransaction};
use warden_entity::user::normalize_email;
use warden_entity::{NewUser, Role, User, UserProfile, UserStatus};

use crate::context::RequestContext;

/// Request to create a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Defaults to `active`.
    #[serde(default)]
    pub status: Option<UserStatus>,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

/// Handles administrative user operations.
#[derive(Clone)]
pub struct UserAdminService {
    store: Arc<dyn IdentityStore>,
    hasher: Arc<PasswordHasher>,
    validator: Arc<PasswordValidator>,
    enforcer: Arc<PermissionEnforcer>,
    guard: OwnerGuard,
}

impl std::fmt::Debug for UserAdminService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAdminService").finish_non_exhaustive()
    }
}

impl UserAdminService {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
        enforcer: Arc<PermissionEnforcer>,
    ) -> Self {
        Self {
            store,
            hasher,
            validator,
            enforcer,
            guard: OwnerGuard::new(),
        }
    }

    /// Gets a user with their current roles.
    pub async fn get_user(&self, ctx: &RequestContext, user_id: Uuid) -> AppResult<UserProfile> {
        ctx.authorize(&self.enforcer, "users:read")?;

        let mut tx = self.store.begin().await?;
        let user = find_user(&mut *tx, user_id).await?;
        let roles = tx.list_roles_for_user(user_id).await?;
        Ok(UserProfile { user, roles })
    }

    /// Looks a user up by login email.
    pub async fn get_user_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
    ) -> AppResult<UserProfile> {
        ctx.authorize(&self.enforcer, "users:read")?;

        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::user_not_found(format!("User '{email}' not found")))?;
        let roles = tx.list_roles_for_user(user.id).await?;
        Ok(UserProfile { user, roles })
    }

    /// Creates a user and assigns its initial roles in one transaction.
    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        req: CreateUserRequest,
    ) -> AppResult<UserProfile> {
        ctx.authorize(&self.enforcer, "users:create")?;

        let email = normalize_email(&req.email);
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::validation("A valid email address is required"));
        }
        let status = req.status.unwrap_or(UserStatus::Active);
        if status == UserStatus::Deleted {
            return Err(AppError::validation("A new user cannot be created as deleted"));
        }
        self.validator.validate(&req.password)?;
        let password_hash = self.hasher.hash_password(&req.password)?;

        let mut tx = self.store.begin().await?;
        let user = tx
            .insert_user(&NewUser {
                email,
                password_hash,
                full_name: req.full_name.trim().to_string(),
                status,
            })
            .await
            .map_err(|e| {
                if e.is(warden_core::ErrorKind::Conflict) {
                    AppError::conflict("Email is already in use")
                } else {
                    e
                }
            })?;

        let roles = self.assign_roles(&mut *tx, &user, &req.role_ids).await?;
        tx.commit().await?;

        info!(
            actor_id = ?ctx.actor_id(),
            user_id = %user.id,
            roles = roles.len(),
            "User created"
        );
        Ok(UserProfile { user, roles })
    }

    /// Replaces a user's role set.
    pub async fn set_user_roles(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> AppResult<UserProfile> {
        ctx.authorize(&self.enforcer, "users:update")?;

        let mut tx = self.store.begin().await?;
        let user = find_user(&mut *tx, user_id).await?;
        let roles = self.assign_roles(&mut *tx, &user, role_ids).await?;
        tx.commit().await?;

        info!(
            actor_id = ?ctx.actor_id(),
            user_id = %user_id,
            roles = ?roles.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "User roles replaced"
        );
        Ok(UserProfile { user, roles })
    }

    /// Changes a user's status. `deleted` soft-deletes the account.
    pub async fn set_user_status(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        status: UserStatus,
    ) -> AppResult<User> {
        let permission = if status == UserStatus::Deleted {
            "users:delete"
        } else {
            "users:update"
        };
        ctx.authorize(&self.enforcer, permission)?;

        if ctx.actor_id() == Some(user_id) {
            return Err(AppError::forbidden("Cannot change your own status"));
        }

        let mut tx = self.store.begin().await?;
        find_user(&mut *tx, user_id).await?;
        self.guard
            .validate_owner_status(&mut *tx, user_id, status)
            .await?;
        let user = tx
            .update_user_status(user_id, status)
            .await?
            .ok_or_else(|| AppError::user_not_found(format!("User {user_id} not found")))?;
        tx.commit().await?;

        info!(
            actor_id = ?ctx.actor_id(),
            user_id = %user_id,
            status = %status,
            "User status changed"
        );
        Ok(user)
    }

    /// Guard, replace, and re-check that an owner stays active.
    async fn assign_roles(
        &self,
        tx: &mut dyn StoreTransaction,
        user: &User,
        role_ids: &[Uuid],
    ) -> AppResult<Vec<Role>> {
        let roles = self
            .guard
            .validate_owner_assignment(tx, user.id, role_ids)
            .await?;
        let ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
        tx.replace_user_roles(user.id, &ids).await?;
        self.guard
            .validate_owner_status(tx, user.id, user.status)
            .await?;
        Ok(roles)
    }
}

async fn find_user(tx: &mut dyn StoreTransaction, user_id: Uuid) -> AppResult<User> {
    tx.find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::user_not_found(format!("User {user_id} not found")))
}
