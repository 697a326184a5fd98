//! Statements over `refresh_tokens`.
//!
//! Every revoke statement is guarded by `revoked_at IS NULL`, so a revoked
//! record keeps its first revocation time and replacement link forever.

use sqlx::PgConnection;
use uuid::Uuid;

use warden_core::result::AppResult;
use warden_entity::{NewRefreshToken, RefreshTokenRecord};

use super::store_error;

pub async fn insert(
    conn: &mut PgConnection,
    token: &NewRefreshToken,
) -> AppResult<RefreshTokenRecord> {
    sqlx::query_as::<_, RefreshTokenRecord>(
        "INSERT INTO refresh_tokens \
         (id, user_id, family_id, token_hash, expires_at, created_by_ip, user_agent) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(token.user_id)
    .bind(token.family_id)
    .bind(&token.token_hash)
    .bind(token.expires_at)
    .bind(token.client.ip.as_deref())
    .bind(token.client.user_agent.as_deref())
    .fetch_one(conn)
    .await
    .map_err(store_error("Failed to insert refresh token"))
}

pub async fn find_by_hash_for_update(
    conn: &mut PgConnection,
    token_hash: &str,
) -> AppResult<Option<RefreshTokenRecord>> {
    sqlx::query_as::<_, RefreshTokenRecord>(
        "SELECT * FROM refresh_tokens WHERE token_hash = $1 FOR UPDATE",
    )
    .bind(token_hash)
    .fetch_optional(conn)
    .await
    .map_err(store_error("Failed to find refresh token"))
}

pub async fn revoke(
    conn: &mut PgConnection,
    id: Uuid,
    replaced_by: Option<Uuid>,
) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = NOW(), replaced_by_token_id = $2 \
         WHERE id = $1 AND revoked_at IS NULL",
    )
    .bind(id)
    .bind(replaced_by)
    .execute(conn)
    .await
    .map_err(store_error("Failed to revoke refresh token"))?;
    Ok(result.rows_affected() > 0)
}

pub async fn revoke_family(conn: &mut PgConnection, family_id: Uuid) -> AppResult<u64> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = NOW() \
         WHERE family_id = $1 AND revoked_at IS NULL",
    )
    .bind(family_id)
    .execute(conn)
    .await
    .map_err(store_error("Failed to revoke token family"))?;
    Ok(result.rows_affected())
}

pub async fn revoke_by_hash(conn: &mut PgConnection, token_hash: &str) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE refresh_tokens SET revoked_at = NOW() \
         WHERE token_hash = $1 AND revoked_at IS NULL",
    )
    .bind(token_hash)
    .execute(conn)
    .await
    .map_err(store_error("Failed to revoke refresh token"))?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_family(
    conn: &mut PgConnection,
    family_id: Uuid,
) -> AppResult<Vec<RefreshTokenRecord>> {
    sqlx::query_as::<_, RefreshTokenRecord>(
        "SELECT * FROM refresh_tokens WHERE family_id = $1 ORDER BY created_at, id",
    )
    .bind(family_id)
    .fetch_all(conn)
    .await
    .map_err(store_error("Failed to list token family"))
}
