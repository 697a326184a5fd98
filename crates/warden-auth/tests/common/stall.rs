//! A store whose transactions hang on `revoke_refresh_token`, after the
//! replacement record has already been written.

use async_trait::async_trait;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_database::{IdentityStore, MemoryIdentityStore, StoreTransaction};
use warden_entity::{
    NewRefreshToken, NewRole, NewUser, Permission, PermissionGrant, RefreshTokenRecord, Role,
    User, UserStatus,
};

pub struct StallingStore {
    inner: MemoryIdentityStore,
}

impl StallingStore {
    pub fn new(inner: MemoryIdentityStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl IdentityStore for StallingStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(StallingTransaction {
            inner: self.inner.begin().await?,
        }))
    }
}

struct StallingTransaction {
    inner: Box<dyn StoreTransaction>,
}

#[async_trait]
impl StoreTransaction for StallingTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.inner.commit().await
    }

    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn find_user_by_email_any(&mut self, email: &str) -> AppResult<Option<User>> {
        self.inner.find_user_by_email_any(email).await
    }

    async fn find_user_by_id(&mut self, id: Uuid) -> AppResult<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn insert_user(&mut self, user: &NewUser) -> AppResult<User> {
        self.inner.insert_user(user).await
    }

    async fn update_user_status(
        &mut self,
        id: Uuid,
        status: UserStatus,
    ) -> AppResult<Option<User>> {
        self.inner.update_user_status(id, status).await
    }

    async fn mark_last_login(&mut self, id: Uuid) -> AppResult<()> {
        self.inner.mark_last_login(id).await
    }

    async fn list_roles_for_user(&mut self, user_id: Uuid) -> AppResult<Vec<Role>> {
        self.inner.list_roles_for_user(user_id).await
    }

    async fn list_permissions_for_user(
        &mut self,
        user_id: Uuid,
    ) -> AppResult<Vec<PermissionGrant>> {
        self.inner.list_permissions_for_user(user_id).await
    }

    async fn find_role_by_id(&mut self, id: Uuid) -> AppResult<Option<Role>> {
        self.inner.find_role_by_id(id).await
    }

    async fn find_roles_by_ids(&mut self, ids: &[Uuid]) -> AppResult<Vec<Role>> {
        self.inner.find_roles_by_ids(ids).await
    }

    async fn find_role_by_name_for_update(&mut self, name: &str) -> AppResult<Option<Role>> {
        self.inner.find_role_by_name_for_update(name).await
    }

    async fn count_role_holders_except(&mut self, role_id: Uuid, user_id: Uuid) -> AppResult<i64> {
        self.inner.count_role_holders_except(role_id, user_id).await
    }

    async fn user_has_role(&mut self, user_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        self.inner.user_has_role(user_id, role_id).await
    }

    async fn list_permissions(&mut self) -> AppResult<Vec<Permission>> {
        self.inner.list_permissions().await
    }

    async fn list_roles(&mut self) -> AppResult<Vec<Role>> {
        self.inner.list_roles().await
    }

    async fn insert_role_if_absent(&mut self, role: &NewRole) -> AppResult<Role> {
        self.inner.insert_role_if_absent(role).await
    }

    async fn insert_role(&mut self, role: &NewRole) -> AppResult<Role> {
        self.inner.insert_role(role).await
    }

    async fn delete_role(&mut self, id: Uuid) -> AppResult<bool> {
        self.inner.delete_role(id).await
    }

    async fn grant_all_permissions(&mut self, role_id: Uuid) -> AppResult<u64> {
        self.inner.grant_all_permissions(role_id).await
    }

    async fn replace_role_permissions(
        &mut self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> AppResult<()> {
        self.inner
            .replace_role_permissions(role_id, permission_ids)
            .await
    }

    async fn assign_role_if_absent(&mut self, user_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        self.inner.assign_role_if_absent(user_id, role_id).await
    }

    async fn replace_user_roles(&mut self, user_id: Uuid, role_ids: &[Uuid]) -> AppResult<()> {
        self.inner.replace_user_roles(user_id, role_ids).await
    }

    async fn insert_refresh_token(
        &mut self,
        token: &NewRefreshToken,
    ) -> AppResult<RefreshTokenRecord> {
        self.inner.insert_refresh_token(token).await
    }

    async fn find_refresh_token_by_hash_for_update(
        &mut self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        self.inner
            .find_refresh_token_by_hash_for_update(token_hash)
            .await
    }

    async fn revoke_refresh_token(
        &mut self,
        _id: Uuid,
        _replaced_by: Option<Uuid>,
    ) -> AppResult<bool> {
        std::future::pending().await
    }

    async fn revoke_family(&mut self, family_id: Uuid) -> AppResult<u64> {
        self.inner.revoke_family(family_id).await
    }

    async fn revoke_refresh_token_by_hash(&mut self, token_hash: &str) -> AppResult<bool> {
        self.inner.revoke_refresh_token_by_hash(token_hash).await
    }

    async fn list_refresh_tokens_in_family(
        &mut self,
        family_id: Uuid,
    ) -> AppResult<Vec<RefreshTokenRecord>> {
        self.inner.list_refresh_tokens_in_family(family_id).await
    }
}
