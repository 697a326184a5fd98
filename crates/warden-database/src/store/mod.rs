//! Transactional store abstraction.
//!
//! Every read and write goes through a [`StoreTransaction`] obtained from
//! [`IdentityStore::begin`]. Committing is the only path to durability:
//! a transaction that is dropped (early return, `?`, a cancelled future)
//! rolls back.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::{
    NewRefreshToken, NewRole, NewUser, Permission, PermissionGrant, RefreshTokenRecord, Role,
    User, UserStatus,
};

pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;

/// Entry point to the persistent store.
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    /// Open a new transaction.
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>>;
}

/// An open transaction over users, roles, permissions and refresh tokens.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Make every write performed through this handle durable.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    // -- users --

    /// Look up a non-deleted user by (normalized) email.
    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>>;

    /// Look up a user by email, soft-deleted rows included.
    async fn find_user_by_email_any(&mut self, email: &str) -> AppResult<Option<User>>;

    /// Look up a non-deleted user by id.
    async fn find_user_by_id(&mut self, id: Uuid) -> AppResult<Option<User>>;

    /// Insert a user. A duplicate email is a `Conflict`.
    async fn insert_user(&mut self, user: &NewUser) -> AppResult<User>;

    /// Change the status of a non-deleted user. `Deleted` also stamps `deleted_at`.
    async fn update_user_status(&mut self, id: Uuid, status: UserStatus)
    -> AppResult<Option<User>>;

    /// Stamp `last_login_at` with the current time.
    async fn mark_last_login(&mut self, id: Uuid) -> AppResult<()>;

    // -- rbac reads --

    /// Roles assigned to a user, ordered by name.
    async fn list_roles_for_user(&mut self, user_id: Uuid) -> AppResult<Vec<Role>>;

    /// One row per (role, permission) grant reachable from the user.
    async fn list_permissions_for_user(&mut self, user_id: Uuid)
    -> AppResult<Vec<PermissionGrant>>;

    async fn find_role_by_id(&mut self, id: Uuid) -> AppResult<Option<Role>>;

    /// Roles whose id is in `ids`. Unknown ids are silently absent from the result.
    async fn find_roles_by_ids(&mut self, ids: &[Uuid]) -> AppResult<Vec<Role>>;

    /// Look up a role by name and lock its row until the transaction ends.
    async fn find_role_by_name_for_update(&mut self, name: &str) -> AppResult<Option<Role>>;

    /// Number of non-deleted users other than `user_id` holding `role_id`.
    async fn count_role_holders_except(&mut self, role_id: Uuid, user_id: Uuid) -> AppResult<i64>;

    async fn user_has_role(&mut self, user_id: Uuid, role_id: Uuid) -> AppResult<bool>;

    /// The whole permission catalogue, ordered by code.
    async fn list_permissions(&mut self) -> AppResult<Vec<Permission>>;

    /// Every role, ordered by name.
    async fn list_roles(&mut self) -> AppResult<Vec<Role>>;

    // -- rbac writes --

    /// Insert a role unless one with the same name exists; returns the stored row either way.
    async fn insert_role_if_absent(&mut self, role: &NewRole) -> AppResult<Role>;

    /// Insert a role. A duplicate name is a `Conflict`.
    async fn insert_role(&mut self, role: &NewRole) -> AppResult<Role>;

    /// Delete a non-system role. Returns `false` when nothing was deleted.
    async fn delete_role(&mut self, id: Uuid) -> AppResult<bool>;

    /// Grant every known permission to a role. Returns the number of new grants.
    async fn grant_all_permissions(&mut self, role_id: Uuid) -> AppResult<u64>;

    /// Replace a role's grant set.
    async fn replace_role_permissions(
        &mut self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> AppResult<()>;

    /// Assign a role unless already assigned. Returns `true` when a row was added.
    async fn assign_role_if_absent(&mut self, user_id: Uuid, role_id: Uuid) -> AppResult<bool>;

    /// Replace a user's role set.
    async fn replace_user_roles(&mut self, user_id: Uuid, role_ids: &[Uuid]) -> AppResult<()>;

    // -- refresh tokens --

    async fn insert_refresh_token(
        &mut self,
        token: &NewRefreshToken,
    ) -> AppResult<RefreshTokenRecord>;

    /// Look up a record by secret hash and lock it until the transaction ends.
    async fn find_refresh_token_by_hash_for_update(
        &mut self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>>;

    /// Revoke one record if it is not already revoked. Returns `true` when it was.
    async fn revoke_refresh_token(
        &mut self,
        id: Uuid,
        replaced_by: Option<Uuid>,
    ) -> AppResult<bool>;

    /// Revoke every still-active record of a family. Returns how many were revoked.
    async fn revoke_family(&mut self, family_id: Uuid) -> AppResult<u64>;

    /// Revoke the record matching a secret hash, if it is still active.
    async fn revoke_refresh_token_by_hash(&mut self, token_hash: &str) -> AppResult<bool>;

    /// Every record of a family, oldest first.
    async fn list_refresh_tokens_in_family(
        &mut self,
        family_id: Uuid,
    ) -> AppResult<Vec<RefreshTokenRecord>>;
}
