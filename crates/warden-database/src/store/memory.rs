//! In-memory store for tests and single-process tooling.
//!
//! A transaction takes the store mutex for its whole lifetime and works on
//! a private copy of the state. Commit publishes the copy; dropping the
//! transaction discards it. Transactions are therefore fully serialised.
//! Never open a second transaction from the task that holds one.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_entity::user::normalize_email;
use warden_entity::{
    NewRefreshToken, NewRole, NewUser, Permission, PermissionGrant, RefreshTokenRecord, Role,
    User, UserStatus,
};

use super::{IdentityStore, StoreTransaction};

/// Baseline permission catalogue, mirroring the initial migration.
const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
    ("users", "read"),
    ("users", "create"),
    ("users", "update"),
    ("users", "delete"),
    ("roles", "read"),
    ("roles", "create"),
    ("roles", "update"),
    ("roles", "delete"),
    ("permissions", "read"),
];

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    roles: HashMap<Uuid, Role>,
    permissions: HashMap<Uuid, Permission>,
    /// (user_id, role_id)
    user_roles: BTreeSet<(Uuid, Uuid)>,
    /// (role_id, permission_id)
    role_permissions: BTreeSet<(Uuid, Uuid)>,
    /// Insertion-ordered.
    refresh_tokens: Vec<RefreshTokenRecord>,
}

impl MemoryState {
    fn live_user(&self, id: Uuid) -> Option<&User> {
        self.users.get(&id).filter(|u| !u.is_deleted())
    }

    fn user_by_email(&self, email: &str) -> Option<&User> {
        let email = normalize_email(email);
        self.users.values().find(|u| u.email == email)
    }

    fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.values().find(|r| r.name == name)
    }

    fn insert_role(&mut self, new_role: &NewRole) -> Role {
        let now = Utc::now();
        let role = Role {
            id: Uuid::new_v4(),
            name: new_role.name.clone(),
            description: new_role.description.clone(),
            is_system: new_role.is_system,
            created_at: now,
            updated_at: now,
        };
        self.roles.insert(role.id, role.clone());
        role
    }

    fn insert_permission(&mut self, resource: &str, action: &str) -> Permission {
        let code = Permission::code_for(resource, action);
        if let Some(existing) = self.permissions.values().find(|p| p.code == code) {
            return existing.clone();
        }
        let permission = Permission {
            id: Uuid::new_v4(),
            code,
            resource: resource.to_string(),
            action: action.to_string(),
        };
        self.permissions.insert(permission.id, permission.clone());
        permission
    }

    fn sorted_roles<'a>(&self, roles: impl Iterator<Item = &'a Role>) -> Vec<Role> {
        let mut roles: Vec<Role> = roles.cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }
}

/// Store holding everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryIdentityStore {
    /// An empty store: no roles, no permissions.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded like a freshly migrated database: the `owner` system
    /// role and the baseline permission catalogue.
    pub fn seeded() -> Self {
        let mut state = MemoryState::default();
        state.insert_role(&NewRole::owner());
        for (resource, action) in DEFAULT_PERMISSIONS {
            state.insert_permission(resource, action);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Add a permission to the catalogue, or return the existing one with the same code.
    pub async fn insert_permission(&self, resource: &str, action: &str) -> Permission {
        self.state.lock().await.insert_permission(resource, action)
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }
}

/// Exclusive handle over the store state.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn find_user_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .working
            .user_by_email(email)
            .filter(|u| !u.is_deleted())
            .cloned())
    }

    async fn find_user_by_email_any(&mut self, email: &str) -> AppResult<Option<User>> {
        Ok(self.working.user_by_email(email).cloned())
    }

    async fn find_user_by_id(&mut self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.working.live_user(id).cloned())
    }

    async fn insert_user(&mut self, new_user: &NewUser) -> AppResult<User> {
        let email = normalize_email(&new_user.email);
        if self.working.user_by_email(&email).is_some() {
            return Err(AppError::conflict(format!(
                "Failed to insert user: duplicate value '{email}'"
            )));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: new_user.password_hash.clone(),
            full_name: new_user.full_name.clone(),
            status: new_user.status,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.working.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_status(
        &mut self,
        id: Uuid,
        status: UserStatus,
    ) -> AppResult<Option<User>> {
        let Some(user) = self.working.users.get_mut(&id).filter(|u| !u.is_deleted()) else {
            return Ok(None);
        };
        let now = Utc::now();
        user.status = status;
        user.updated_at = now;
        if status == UserStatus::Deleted {
            user.deleted_at = Some(now);
        }
        Ok(Some(user.clone()))
    }

    async fn mark_last_login(&mut self, id: Uuid) -> AppResult<()> {
        if let Some(user) = self.working.users.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn list_roles_for_user(&mut self, user_id: Uuid) -> AppResult<Vec<Role>> {
        let state = &self.working;
        Ok(state.sorted_roles(
            state
                .user_roles
                .iter()
                .filter(|(u, _)| *u == user_id)
                .filter_map(|(_, r)| state.roles.get(r)),
        ))
    }

    async fn list_permissions_for_user(
        &mut self,
        user_id: Uuid,
    ) -> AppResult<Vec<PermissionGrant>> {
        let state = &self.working;
        let mut grants: Vec<PermissionGrant> = state
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .flat_map(move |(_, role_id)| {
                state
                    .role_permissions
                    .iter()
                    .filter(move |(r, _)| r == role_id)
                    .filter_map(move |(r, p)| {
                        state.permissions.get(p).map(|permission| PermissionGrant {
                            role_id: *r,
                            permission: permission.clone(),
                        })
                    })
            })
            .collect();
        grants.sort_by(|a, b| {
            a.permission
                .code
                .cmp(&b.permission.code)
                .then(a.role_id.cmp(&b.role_id))
        });
        Ok(grants)
    }

    async fn find_role_by_id(&mut self, id: Uuid) -> AppResult<Option<Role>> {
        Ok(self.working.roles.get(&id).cloned())
    }

    async fn find_roles_by_ids(&mut self, ids: &[Uuid]) -> AppResult<Vec<Role>> {
        let state = &self.working;
        let unique: BTreeSet<&Uuid> = ids.iter().collect();
        Ok(state.sorted_roles(unique.into_iter().filter_map(|id| state.roles.get(id))))
    }

    async fn find_role_by_name_for_update(&mut self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .working
            .roles
            .values()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn count_role_holders_except(&mut self, role_id: Uuid, user_id: Uuid) -> AppResult<i64> {
        let state = &self.working;
        let count = state
            .user_roles
            .iter()
            .filter(|(u, r)| *r == role_id && *u != user_id)
            .filter(|(u, _)| state.live_user(*u).is_some())
            .count();
        Ok(count as i64)
    }

    async fn user_has_role(&mut self, user_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        Ok(self.working.user_roles.contains(&(user_id, role_id)))
    }

    async fn list_permissions(&mut self) -> AppResult<Vec<Permission>> {
        let mut permissions: Vec<Permission> =
            self.working.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(permissions)
    }

    async fn list_roles(&mut self) -> AppResult<Vec<Role>> {
        let state = &self.working;
        Ok(state.sorted_roles(state.roles.values()))
    }

    async fn insert_role_if_absent(&mut self, new_role: &NewRole) -> AppResult<Role> {
        if let Some(existing) = self.working.role_by_name(&new_role.name) {
            return Ok(existing.clone());
        }
        Ok(self.working.insert_role(new_role))
    }

    async fn insert_role(&mut self, new_role: &NewRole) -> AppResult<Role> {
        if self.working.role_by_name(&new_role.name).is_some() {
            return Err(AppError::conflict(format!(
                "Failed to insert role: duplicate value '{}'",
                new_role.name
            )));
        }
        Ok(self.working.insert_role(new_role))
    }

    async fn delete_role(&mut self, id: Uuid) -> AppResult<bool> {
        let state = &mut self.working;
        let deletable = state.roles.get(&id).is_some_and(|r| !r.is_system);
        if !deletable {
            return Ok(false);
        }
        state.roles.remove(&id);
        state.user_roles.retain(|(_, r)| *r != id);
        state.role_permissions.retain(|(r, _)| *r != id);
        Ok(true)
    }

    async fn grant_all_permissions(&mut self, role_id: Uuid) -> AppResult<u64> {
        let state = &mut self.working;
        let mut granted = 0;
        for permission_id in state.permissions.keys() {
            if state.role_permissions.insert((role_id, *permission_id)) {
                granted += 1;
            }
        }
        Ok(granted)
    }

    async fn replace_role_permissions(
        &mut self,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> AppResult<()> {
        let state = &mut self.working;
        if let Some(missing) = permission_ids
            .iter()
            .find(|id| !state.permissions.contains_key(*id))
        {
            return Err(AppError::not_found(format!("Permission {missing} not found")));
        }
        state.role_permissions.retain(|(r, _)| *r != role_id);
        state
            .role_permissions
            .extend(permission_ids.iter().map(|p| (role_id, *p)));
        Ok(())
    }

    async fn assign_role_if_absent(&mut self, user_id: Uuid, role_id: Uuid) -> AppResult<bool> {
        Ok(self.working.user_roles.insert((user_id, role_id)))
    }

    async fn replace_user_roles(&mut self, user_id: Uuid, role_ids: &[Uuid]) -> AppResult<()> {
        let state = &mut self.working;
        state.user_roles.retain(|(u, _)| *u != user_id);
        state
            .user_roles
            .extend(role_ids.iter().map(|r| (user_id, *r)));
        Ok(())
    }

    async fn insert_refresh_token(
        &mut self,
        token: &NewRefreshToken,
    ) -> AppResult<RefreshTokenRecord> {
        if self
            .working
            .refresh_tokens
            .iter()
            .any(|t| t.token_hash == token.token_hash)
        {
            return Err(AppError::conflict(
                "Failed to insert refresh token: duplicate value",
            ));
        }
        let record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id: token.user_id,
            family_id: token.family_id,
            token_hash: token.token_hash.clone(),
            expires_at: token.expires_at,
            revoked_at: None,
            replaced_by_token_id: None,
            created_by_ip: token.client.ip.clone(),
            user_agent: token.client.user_agent.clone(),
            created_at: Utc::now(),
        };
        self.working.refresh_tokens.push(record.clone());
        Ok(record)
    }

    async fn find_refresh_token_by_hash_for_update(
        &mut self,
        token_hash: &str,
    ) -> AppResult<Option<RefreshTokenRecord>> {
        Ok(self
            .working
            .refresh_tokens
            .iter()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn revoke_refresh_token(
        &mut self,
        id: Uuid,
        replaced_by: Option<Uuid>,
    ) -> AppResult<bool> {
        let now = Utc::now();
        Ok(self
            .working
            .refresh_tokens
            .iter_mut()
            .find(|t| t.id == id && t.revoked_at.is_none())
            .map(|t| {
                t.revoked_at = Some(now);
                t.replaced_by_token_id = replaced_by;
            })
            .is_some())
    }

    async fn revoke_family(&mut self, family_id: Uuid) -> AppResult<u64> {
        let now = Utc::now();
        let mut revoked = 0;
        for token in self
            .working
            .refresh_tokens
            .iter_mut()
            .filter(|t| t.family_id == family_id && t.revoked_at.is_none())
        {
            token.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn revoke_refresh_token_by_hash(&mut self, token_hash: &str) -> AppResult<bool> {
        let now = Utc::now();
        Ok(self
            .working
            .refresh_tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash && t.revoked_at.is_none())
            .map(|t| t.revoked_at = Some(now))
            .is_some())
    }

    async fn list_refresh_tokens_in_family(
        &mut self,
        family_id: Uuid,
    ) -> AppResult<Vec<RefreshTokenRecord>> {
        Ok(self
            .working
            .refresh_tokens
            .iter()
            .filter(|t| t.family_id == family_id)
            .cloned()
            .collect())
    }
}
