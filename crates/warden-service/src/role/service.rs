//! Role management: creation, deletion and permission grants.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use warden_auth::PermissionEnforcer;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::{IdentityStore, StoreTransaction};
use warden_entity::{NewRole, OWNER_ROLE_NAME, Permission, Role};

use crate::context::RequestContext;

/// Handles role CRUD and role→permission grants.
///
/// System roles are read-only here: the owner role's grants are maintained
/// by the bootstrap.
#[derive(Clone)]
pub struct RoleService {
    store: Arc<dyn IdentityStore>,
    enforcer: Arc<PermissionEnforcer>,
}

impl std::fmt::Debug for RoleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleService").finish_non_exhaustive()
    }
}

impl RoleService {
    pub fn new(store: Arc<dyn IdentityStore>, enforcer: Arc<PermissionEnforcer>) -> Self {
        Self { store, enforcer }
    }

    pub async fn list_roles(&self, ctx: &RequestContext) -> AppResult<Vec<Role>> {
        ctx.authorize(&self.enforcer, "roles:read")?;
        let mut tx = self.store.begin().await?;
        let roles = tx.list_roles().await?;
        Ok(roles)
    }

    pub async fn list_permissions(&self, ctx: &RequestContext) -> AppResult<Vec<Permission>> {
        ctx.authorize(&self.enforcer, "permissions:read")?;
        let mut tx = self.store.begin().await?;
        let permissions = tx.list_permissions().await?;
        Ok(permissions)
    }

    /// Creates a non-system role. Names are unique.
    pub async fn create_role(
        &self,
        ctx: &RequestContext,
        name: &str,
        description: &str,
    ) -> AppResult<Role> {
        ctx.authorize(&self.enforcer, "roles:create")?;

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Role name must not be empty"));
        }
        if name.eq_ignore_ascii_case(OWNER_ROLE_NAME) {
            return Err(AppError::conflict("The owner role name is reserved"));
        }

        let mut tx = self.store.begin().await?;
        let role = tx
            .insert_role(&NewRole {
                name: name.to_string(),
                description: description.trim().to_string(),
                is_system: false,
            })
            .await
            .map_err(|e| {
                if e.is(warden_core::ErrorKind::Conflict) {
                    AppError::conflict(format!("Role '{name}' already exists"))
                } else {
                    e
                }
            })?;
        tx.commit().await?;

        info!(actor_id = ?ctx.actor_id(), role_id = %role.id, name = %role.name, "Role created");
        Ok(role)
    }

    /// Deletes a non-system role together with its assignments and grants.
    pub async fn delete_role(&self, ctx: &RequestContext, role_id: Uuid) -> AppResult<()> {
        ctx.authorize(&self.enforcer, "roles:delete")?;

        let mut tx = self.store.begin().await?;
        let role = find_mutable_role(&mut *tx, role_id).await?;
        if !tx.delete_role(role.id).await? {
            return Err(AppError::not_found(format!("Role {role_id} not found")));
        }
        tx.commit().await?;

        info!(actor_id = ?ctx.actor_id(), role_id = %role_id, name = %role.name, "Role deleted");
        Ok(())
    }

    /// Replaces the permission set granted by a non-system role.
    pub async fn set_role_permissions(
        &self,
        ctx: &RequestContext,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> AppResult<Vec<Permission>> {
        ctx.authorize(&self.enforcer, "roles:update")?;

        let mut tx = self.store.begin().await?;
        let role = find_mutable_role(&mut *tx, role_id).await?;

        let requested: HashSet<Uuid> = permission_ids.iter().copied().collect();
        let granted: Vec<Permission> = tx
            .list_permissions()
            .await?
            .into_iter()
            .filter(|p| requested.contains(&p.id))
            .collect();
        if granted.len() != requested.len() {
            let known: HashSet<Uuid> = granted.iter().map(|p| p.id).collect();
            let missing = requested.difference(&known).next().copied().unwrap_or_default();
            return Err(AppError::not_found(format!("Permission {missing} not found")));
        }

        let ids: Vec<Uuid> = granted.iter().map(|p| p.id).collect();
        tx.replace_role_permissions(role.id, &ids).await?;
        tx.commit().await?;

        info!(
            actor_id = ?ctx.actor_id(),
            role_id = %role.id,
            permissions = ?granted.iter().map(|p| p.code.as_str()).collect::<Vec<_>>(),
            "Role permissions replaced"
        );
        Ok(granted)
    }
}

/// Loads a role that may be edited: it must exist and not be a system role.
async fn find_mutable_role(tx: &mut dyn StoreTransaction, role_id: Uuid) -> AppResult<Role> {
    let role = tx
        .find_role_by_id(role_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Role {role_id} not found")))?;
    if role.is_system {
        return Err(AppError::conflict(format!(
            "System role '{}' cannot be modified",
            role.name
        )));
    }
    Ok(role)
}
