//! Aggregates a user's effective permissions across their roles.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use uuid::Uuid;

use warden_core::result::AppResult;
use warden_database::StoreTransaction;
use warden_entity::Permission;

/// Result of resolving a user's permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPermissions {
    /// Distinct permission codes, sorted lexicographically.
    pub scope: Vec<String>,
    /// Roles granting at least one permission in `scope`, sorted.
    pub role_ids: Vec<Uuid>,
    /// The permissions behind `scope`, in the same order.
    pub permissions: Vec<Permission>,
}

impl ResolvedPermissions {
    pub fn is_empty(&self) -> bool {
        self.scope.is_empty()
    }
}

/// Walks user → roles → permission grants and de-duplicates by code.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionResolver;

impl PermissionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve inside the caller's transaction, so the snapshot matches
    /// whatever else that transaction reads or writes.
    pub async fn resolve(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
    ) -> AppResult<ResolvedPermissions> {
        let roles = tx.list_roles_for_user(user_id).await?;
        if roles.is_empty() {
            return Ok(ResolvedPermissions::default());
        }
        let assigned: HashSet<Uuid> = roles.iter().map(|r| r.id).collect();

        let grants = tx.list_permissions_for_user(user_id).await?;

        let mut by_code: BTreeMap<String, Permission> = BTreeMap::new();
        let mut granting: BTreeSet<Uuid> = BTreeSet::new();
        for grant in grants
            .into_iter()
            .filter(|g| assigned.contains(&g.role_id))
        {
            granting.insert(grant.role_id);
            by_code
                .entry(grant.permission.code.clone())
                .or_insert(grant.permission);
        }

        Ok(ResolvedPermissions {
            scope: by_code.keys().cloned().collect(),
            role_ids: granting.into_iter().collect(),
            permissions: by_code.into_values().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_database::{IdentityStore, MemoryIdentityStore};
    use warden_entity::{NewRole, NewUser, UserStatus};

    async fn role(tx: &mut dyn StoreTransaction, name: &str, permissions: &[Uuid]) -> Uuid {
        let role = tx
            .insert_role(&NewRole {
                name: name.to_string(),
                description: String::new(),
                is_system: false,
            })
            .await
            .unwrap();
        tx.replace_role_permissions(role.id, permissions).await.unwrap();
        role.id
    }

    #[tokio::test]
    async fn test_union_is_deduplicated_and_sorted() {
        let store = MemoryIdentityStore::new();
        let read = store.insert_permission("docs", "read").await;
        let write = store.insert_permission("docs", "write").await;
        let audit = store.insert_permission("audit", "read").await;

        let mut tx = store.begin().await.unwrap();
        let user = tx
            .insert_user(&NewUser {
                email: "a@x.com".to_string(),
                password_hash: String::new(),
                full_name: "A".to_string(),
                status: UserStatus::Active,
            })
            .await
            .unwrap();
        let editor = role(&mut *tx, "editor", &[read.id, write.id]).await;
        let reviewer = role(&mut *tx, "reviewer", &[read.id, audit.id]).await;
        let empty = role(&mut *tx, "empty", &[]).await;
        tx.replace_user_roles(user.id, &[editor, reviewer, empty]).await.unwrap();

        let resolved = PermissionResolver::new().resolve(&mut *tx, user.id).await.unwrap();
        assert_eq!(resolved.scope, vec!["audit:read", "docs:read", "docs:write"]);

        let mut expected = vec![editor, reviewer];
        expected.sort();
        assert_eq!(resolved.role_ids, expected);
        assert_eq!(resolved.permissions.len(), 3);
    }

    #[tokio::test]
    async fn test_user_without_roles_resolves_empty() {
        let store = MemoryIdentityStore::seeded();
        let mut tx = store.begin().await.unwrap();
        let resolved = PermissionResolver::new()
            .resolve(&mut *tx, Uuid::new_v4())
            .await
            .unwrap();
        assert!(resolved.is_empty());
        assert!(resolved.role_ids.is_empty());
    }
}
