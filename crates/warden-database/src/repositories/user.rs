//! Statements over `users`.

use sqlx::PgConnection;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::user::normalize_email;
use warden_entity::{NewUser, User, UserStatus};

use super::store_error;

pub async fn find_by_email(conn: &mut PgConnection, email: &str) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL")
        .bind(normalize_email(email))
        .fetch_optional(conn)
        .await
        .map_err(store_error("Failed to find user by email"))
}

/// Same as [`find_by_email`] but soft-deleted rows are returned too.
pub async fn find_by_email_any(conn: &mut PgConnection, email: &str) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(normalize_email(email))
        .fetch_optional(conn)
        .await
        .map_err(store_error("Failed to find user by email"))
}

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(store_error("Failed to find user by id"))
}

pub async fn insert(conn: &mut PgConnection, user: &NewUser) -> AppResult<User> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, full_name, status) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(normalize_email(&user.email))
    .bind(&user.password_hash)
    .bind(&user.full_name)
    .bind(user.status)
    .fetch_one(conn)
    .await
    .map_err(store_error("Failed to insert user"))
}

/// Update the status of a live user. Moving to `deleted` stamps `deleted_at`.
pub async fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: UserStatus,
) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET status = $2, updated_at = NOW(), \
         deleted_at = CASE WHEN $2 = 'deleted'::user_status THEN NOW() ELSE NULL END \
         WHERE id = $1 AND deleted_at IS NULL \
         RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(conn)
    .await
    .map_err(store_error("Failed to update user status"))
}

pub async fn mark_last_login(conn: &mut PgConnection, id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map_err(store_error("Failed to update last login"))?;
    Ok(())
}
