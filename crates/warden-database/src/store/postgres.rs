//! PostgreSQL-backed store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::{
    NewRefreshToken, NewRole, NewUser, Permission, PermissionGrant, RefreshTokenRecord, Role,
    User, UserStatus,
};

use super::{IdentityStore, StoreTransaction};
use crate::repositories::{permission, refresh_token, role, store_error, user};

/// Store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(store_error("Failed to begin transaction"))?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }
}

/// An open sqlx transaction. Dropping it without commit rolls back.
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(store_error("Failed to commit transaction"))
    }

    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        user::find_by_email(&mut self.tx, email).await
    }

    async fn find_user_by_email_any(&mut self, email: &str) -> AppResult<Option<User>> {
        user::find_by_email_any(&mut self.tx, email).await
    }

    async fn find_user_by_id(&mut self, id: Uuid) -> AppResult<Option<User>> {
        user::find_by_id(&mut self.tx, id).await
    }

    async fn insert_user(&mut self, new_user: &NewUser) -> AppResult<User> {
        user::insert(&mut self.tx, new_user).await
    }

    async fn update_user_status(
        &mut self,
        id: Uuid,
        status: UserStatus,
    ) -> AppResult<Option<User>> {
        user::update_status(&mut self.tx, id, status).await
    }

    async fn mark_last_login(&mut self, id: Uuid) -> AppResult<()> {
        user::mark_last_login(&mut self.tx, id).await
    }

    async fn list_roles_for_user(&mut self, user_id: Uuid) -> AppResult<Vec<Role>> {
        role::list_for_user(&mut self.tx, user_id).await
    }

    async fn list_permissions_for_user(
        &mut self,
        user_id: Uuid,
    ) -> AppResult<Vec<PermissionGrant>> {
        permission::list_grants_for_user(&mut self.tx, user_id).await
    }

    async fn find_role_by_id(&mut self, id: Uuid) -> AppResult<Option<Role>> {
        role::find_by_id(&mut self.tx, id).await
    }

    async fn find_roles_by_ids(&mut self, ids: &[Uuid]) -> AppResult<Vec<Role>> {
        role::find_by_ids(&mut self.tx, ids).await
    }

    async fn find_role_by_name_for_update(&mut self, name: &str) -> AppResult<Option<Role>> {
        role::find_by_name_for_update(&mut self.tx, name).await
    }

    async fn count_role_holders_except(&mut self, role_id: Uuid, user_id: Uuid) -> AppResult<i64> {
        role::count_holders_except(&mut self.tx, role_id, user_id).await
    }

    async fn user_has_role(&mut self, user_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        role::user_has_role(&mut self.tx, user_id, role_id).await
    }

    async fn list_permissions(&mut self) -> AppResult<Vec<Permission>> {
        permission::list_all(&mut self.tx).await
    }

    async fn list_roles(&mut self) -> AppResult<Vec<Role>> {
        role::list_all(&mut self.tx).await
    }

    async fn insert_role_if_absent(&mut self, new_role: &NewRole) -> AppResult<Role> {
        role::insert_if_absent(&mut self.tx, new_role).await
    }

    async fn insert_role(&mut self, new_role: &NewRole) -> AppResult<Role> {
        role::insert(&mut self.tx, new_role).await
    }

    async fn delete_role(&mut self, id: Uuid) -> AppResult<bool> {
        role::delete_non_system(&mut self.tx, id).await
    }

    async fn grant_all_permissions(&mut self, role_id: Uuid) -> AppResult<u64> {
        permission::grant_all(&mut self.tx, role_id).await
    }

    async fn replace_role_permissions(
        &mut self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> AppResult<()> {
        permission::replace_for_role(&mut self.tx, role_id, permission_ids).await
    }

    async fn assign_role_if_absent(&mut self, user_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        role::assign_if_absent(&mut self.tx, user_id, role_id).await
    }

    async fn replace_user_roles(&mut self, user_id: Uuid, role_ids: &[Uuid]) -> AppResult<()> {
        role::replace_for_user(&mut self.tx, user_id, role_ids).await
    }

    async fn insert_refresh_token(
        &mut self,
        token: &NewRefreshToken,
    ) -> AppResult<RefreshTokenRecord> {
        refresh_token::insert(&mut self.tx, token).await
    }

    async fn find_refresh_token_by_hash_for_update(
        &mut self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        refresh_token::find_by_hash_for_update(&mut self.tx, token_hash).await
    }

    async fn revoke_refresh_token(
        &mut self,
        id: Uuid,
        replaced_by: Option<Uuid>,
    ) -> AppResult<bool> {
        refresh_token::revoke(&mut self.tx, id, replaced_by).await
    }

    async fn revoke_family(&mut self, family_id: Uuid) -> AppResult<u64> {
        refresh_token::revoke_family(&mut self.tx, family_id).await
    }

    async fn revoke_refresh_token_by_hash(&mut self, token_hash: &str) -> AppResult<bool> {
        refresh_token::revoke_by_hash(&mut self.tx, token_hash).await
    }

    async fn list_refresh_tokens_in_family(
        &mut self,
        family_id: Uuid,
    ) -> AppResult<Vec<RefreshTokenRecord>> {
        refresh_token::list_family(&mut self.tx, family_id).await
    }
}
