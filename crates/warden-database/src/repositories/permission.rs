//! Statements over `permissions` and `role_permissions`.

use sqlx::PgConnection;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::{Permission, PermissionGrant};

use super::store_error;

pub async fn list_all(conn: &mut PgConnection) -> AppResult<Vec<Permission>> {
    sqlx::query_as::<_, Permission>("SELECT id, code, resource, action FROM permissions ORDER BY code")
        .fetch_all(conn)
        .await
        .map_err(store_error("Failed to list permissions"))
}

/// Walk user → role → permission. One row per grant, so a permission reachable
/// through two roles appears twice.
pub async fn list_grants_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> AppResult<Vec<PermissionGrant>> {
    sqlx::query_as::<_, PermissionGrant>(
        "SELECT rp.role_id, p.id, p.code, p.resource, p.action \
         FROM user_roles ur \
         JOIN role_permissions rp ON rp.role_id = ur.role_id \
         JOIN permissions p ON p.id = rp.permission_id \
         WHERE ur.user_id = $1 \
         ORDER BY p.code, rp.role_id",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
    .map_err(store_error("Failed to list permissions for user"))
}

pub async fn grant_all(conn: &mut PgConnection, role_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id) \
         SELECT $1, id FROM permissions \
         ON CONFLICT DO NOTHING",
    )
    .bind(role_id)
    .execute(conn)
    .await
    .map_err(store_error("Failed to grant permissions"))?;
    Ok(result.rows_affected())
}

pub async fn replace_for_role(
    conn: &mut PgConnection,
    role_id: Uuid,
    permission_ids: &[Uuid],
) -> AppResult<()> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
        .bind(role_id)
        .execute(&mut *conn)
        .await
        .map_err(store_error("Failed to clear role permissions"))?;

    sqlx::query(
        "INSERT INTO role_permissions (role_id, permission_id) \
         SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
    )
    .bind(role_id)
    .bind(permission_ids)
    .execute(conn)
    .await
    .map_err(store_error("Failed to grant role permissions"))?;
    Ok(())
}
