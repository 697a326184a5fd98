//! Statements over `roles` and `user_roles`.

use sqlx::PgConnection;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::{NewRole, Role};

use super::store_error;

pub async fn list_for_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<Role>> {
    sqlx::query_as::<_, Role>(
        "SELECT r.* FROM roles r \
         JOIN user_roles ur ON ur.role_id = r.id \
         WHERE ur.user_id = $1 \
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
    .map_err(store_error("Failed to list roles for user"))
}

pub async fn list_all(conn: &mut PgConnection) -> AppResult<Vec<Role>> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name")
        .fetch_all(conn)
        .await
        .map_err(store_error("Failed to list roles"))
}

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Role>> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(store_error("Failed to find role"))
}

pub async fn find_by_ids(conn: &mut PgConnection, ids: &[Uuid]) -> AppResult<Vec<Role>> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = ANY($1) ORDER BY name")
        .bind(ids)
        .fetch_all(conn)
        .await
        .map_err(store_error("Failed to find roles"))
}

/// Row-locks the role so concurrent owner mutations serialise on it.
pub async fn find_by_name_for_update(
    conn: &mut PgConnection,
    name: &str,
) -> AppResult<Option<Role>> {
    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE LOWER(name) = LOWER($1) FOR UPDATE")
        .bind(name)
        .fetch_optional(conn)
        .await
        .map_err(store_error("Failed to lock role"))
}

pub async fn count_holders_except(
    conn: &mut PgConnection,
    role_id: Uuid,
    user_id: Uuid,
) -> AppResult<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM user_roles ur \
         JOIN users u ON u.id = ur.user_id \
         WHERE ur.role_id = $1 AND ur.user_id <> $2 AND u.deleted_at IS NULL",
    )
    .bind(role_id)
    .bind(user_id)
    .fetch_one(conn)
    .await
    .map_err(store_error("Failed to count role holders"))
}

pub async fn user_has_role(conn: &mut PgConnection, user_id: Uuid, role_id: Uuid) -> AppResult<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM user_roles WHERE user_id = $1 AND role_id = $2)",
    )
    .bind(user_id)
    .bind(role_id)
    .fetch_one(conn)
    .await
    .map_err(store_error("Failed to check role assignment"))
}

pub async fn insert_if_absent(conn: &mut PgConnection, role: &NewRole) -> AppResult<Role> {
    sqlx::query(
        "INSERT INTO roles (name, description, is_system) VALUES ($1, $2, $3) \
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(&role.name)
    .bind(&role.description)
    .bind(role.is_system)
    .execute(&mut *conn)
    .await
    .map_err(store_error("Failed to insert role"))?;

    sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = $1")
        .bind(&role.name)
        .fetch_one(conn)
        .await
        .map_err(store_error("Failed to read role"))
}

pub async fn insert(conn: &mut PgConnection, role: &NewRole) -> AppResult<Role> {
    sqlx::query_as::<_, Role>(
        "INSERT INTO roles (name, description, is_system) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&role.name)
    .bind(&role.description)
    .bind(role.is_system)
    .fetch_one(conn)
    .await
    .map_err(store_error("Failed to insert role"))
}

/// System roles are never deleted; the statement simply does not match them.
pub async fn delete_non_system(conn: &mut PgConnection, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM roles WHERE id = $1 AND is_system = FALSE")
        .bind(id)
        .execute(conn)
        .await
        .map_err(store_error("Failed to delete role"))?;
    Ok(result.rows_affected() > 0)
}

pub async fn assign_if_absent(
    conn: &mut PgConnection,
    user_id: Uuid,
    role_id: Uuid,
) -> AppResult<bool> {
    let result = sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(conn)
    .await
    .map_err(store_error("Failed to assign role"))?;
    Ok(result.rows_affected() > 0)
}

pub async fn replace_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
    role_ids: &[Uuid],
) -> AppResult<()> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await
        .map_err(store_error("Failed to clear user roles"))?;

    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) \
         SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_ids)
    .execute(conn)
    .await
    .map_err(store_error("Failed to assign user roles"))?;
    Ok(())
}
