//! Session lifecycle manager: login, refresh rotation, logout and `me`.
//!
//! Refresh records form families: a login starts a family and every
//! rotation adds a record to it. A record is single-use; presenting one
//! that was already revoked means the secret leaked, so the whole family
//! is revoked.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use warden_core::config::AuthConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::{IdentityStore, StoreTransaction};
use warden_entity::{
    ClientMeta, NewRefreshToken, RefreshTokenRecord, RefreshTokenState, User, UserProfile,
};

use crate::jwt::JwtEncoder;
use crate::jwt::encoder::expires_after;
use crate::password::PasswordHasher;
use crate::rbac::PermissionResolver;
use crate::refresh::{generate_refresh_secret, hash_refresh_secret};

use super::result::SessionResult;

/// Orchestrates credential checks, permission resolution, token issuance
/// and refresh rotation over one store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn IdentityStore>,
    encoder: Arc<JwtEncoder>,
    hasher: Arc<PasswordHasher>,
    resolver: PermissionResolver,
    refresh_ttl: Duration,
    operation_timeout: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("encoder", &self.encoder)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        encoder: Arc<JwtEncoder>,
        hasher: Arc<PasswordHasher>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            store,
            encoder,
            hasher,
            resolver: PermissionResolver::new(),
            refresh_ttl: config.refresh_token_ttl(),
            operation_timeout: config.operation_timeout(),
        }
    }

    /// Authenticate with email and password and open a new session family.
    ///
    /// Unknown email and wrong password are both `InvalidCredentials`. The
    /// status check happens only after the password matched.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientMeta,
    ) -> AppResult<SessionResult> {
        let result = self
            .with_deadline("login", self.login_inner(email, password, &client))
            .await?;

        if let Err(e) = self.mark_last_login(result.user.user.id).await {
            warn!(user_id = %result.user.user.id, error = %e, "Failed to record last login");
        }
        Ok(result)
    }

    async fn login_inner(
        &self,
        email: &str,
        password: &str,
        client: &ClientMeta,
    ) -> AppResult<SessionResult> {
        let mut tx = self.store.begin().await?;

        let Some(user) = tx.find_user_by_email(email).await? else {
            self.hasher.verify_decoy(password);
            warn!(reason = "unknown_email", "Login failed");
            return Err(AppError::invalid_credentials());
        };

        if !self.hasher.verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, reason = "password_mismatch", "Login failed");
            return Err(AppError::invalid_credentials());
        }

        if !user.can_login() {
            warn!(user_id = %user.id, status = %user.status, reason = "not_active", "Login failed");
            return Err(AppError::user_not_active(format!(
                "User account is {}",
                user.status
            )));
        }

        let family_id = Uuid::new_v4();
        let (refresh_secret, record) = self
            .issue_refresh_record(&mut *tx, user.id, family_id, client)
            .await?;
        let result = self
            .issue_session(&mut *tx, user, refresh_secret, &record)
            .await?;

        tx.commit().await?;

        info!(
            user_id = %result.user.user.id,
            family_id = %family_id,
            roles = result.user.roles.len(),
            "Login successful"
        );
        Ok(result)
    }

    /// Rotate a refresh secret: revoke the presented record, issue its
    /// replacement in the same family, and issue a fresh access token with
    /// re-resolved permissions. Everything commits together or not at all.
    pub async fn refresh(
        &self,
        presented: Option<&str>,
        client: ClientMeta,
    ) -> AppResult<SessionResult> {
        let secret = presented
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(AppError::missing_refresh_token)?;

        self.with_deadline("refresh", self.refresh_inner(secret, &client))
            .await
    }

    async fn refresh_inner(&self, secret: &str, client: &ClientMeta) -> AppResult<SessionResult> {
        let token_hash = hash_refresh_secret(secret);
        let mut tx = self.store.begin().await?;

        let Some(presented) = tx.find_refresh_token_by_hash_for_update(&token_hash).await? else {
            warn!(hash_prefix = &token_hash[..8], "Refresh with unknown token");
            return Err(AppError::invalid_refresh_token());
        };

        match presented.state_at(Utc::now()) {
            RefreshTokenState::Active => {}
            RefreshTokenState::Revoked => {
                let revoked = tx.revoke_family(presented.family_id).await?;
                tx.commit().await?;
                warn!(
                    user_id = %presented.user_id,
                    family_id = %presented.family_id,
                    token_id = %presented.id,
                    revoked,
                    "Refresh token reuse detected; family revoked"
                );
                return Err(AppError::refresh_token_reuse());
            }
            RefreshTokenState::Expired => {
                info!(token_id = %presented.id, family_id = %presented.family_id, "Refresh with expired token");
                return Err(AppError::refresh_token_expired());
            }
        }

        let user = match tx.find_user_by_id(presented.user_id).await? {
            Some(user) if user.can_login() => user,
            found => {
                let revoked = tx.revoke_family(presented.family_id).await?;
                tx.commit().await?;
                warn!(
                    user_id = %presented.user_id,
                    family_id = %presented.family_id,
                    revoked,
                    "Refresh for a user that can no longer log in; family revoked"
                );
                return Err(match found {
                    Some(user) => {
                        AppError::user_not_active(format!("User account is {}", user.status))
                    }
                    None => AppError::user_not_found("User no longer exists"),
                });
            }
        };

        let (refresh_secret, replacement) = self
            .issue_refresh_record(&mut *tx, user.id, presented.family_id, client)
            .await?;

        if !tx
            .revoke_refresh_token(presented.id, Some(replacement.id))
            .await?
        {
            return Err(AppError::invalid_refresh_token());
        }

        let result = self
            .issue_session(&mut *tx, user, refresh_secret, &replacement)
            .await?;

        tx.commit().await?;

        info!(
            user_id = %result.user.user.id,
            family_id = %presented.family_id,
            old_token_id = %presented.id,
            new_token_id = %replacement.id,
            "Refresh token rotated"
        );
        Ok(result)
    }

    /// Revoke the presented refresh record. Absent or unknown secrets are not errors.
    pub async fn logout(&self, presented: Option<&str>) -> AppResult<()> {
        let Some(secret) = presented.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(());
        };

        self.with_deadline("logout", async {
            let mut tx = self.store.begin().await?;
            let revoked = tx
                .revoke_refresh_token_by_hash(&hash_refresh_secret(secret))
                .await?;
            tx.commit().await?;
            info!(revoked, "Logout");
            Ok(())
        })
        .await
    }

    /// Current identity and role snapshot of an authenticated user.
    pub async fn me(&self, user_id: Uuid) -> AppResult<UserProfile> {
        self.with_deadline("me", async {
            let mut tx = self.store.begin().await?;
            let user = tx
                .find_user_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::user_not_found(format!("User {user_id} not found")))?;
            let roles = tx.list_roles_for_user(user_id).await?;
            Ok(UserProfile { user, roles })
        })
        .await
    }

    /// Resolve permissions, sign the access token, and assemble the result.
    async fn issue_session(
        &self,
        tx: &mut dyn StoreTransaction,
        user: User,
        refresh_secret: String,
        record: &RefreshTokenRecord,
    ) -> AppResult<SessionResult> {
        let roles = tx.list_roles_for_user(user.id).await?;
        let resolved = self.resolver.resolve(tx, user.id).await?;
        let access = self.encoder.issue_access_token(
            user.id,
            &resolved.role_ids,
            &resolved.scope,
            self.encoder.default_ttl(),
        )?;

        Ok(SessionResult::new(
            access,
            resolved.scope,
            UserProfile { user, roles },
            refresh_secret,
            record.expires_at,
        ))
    }

    async fn issue_refresh_record(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        family_id: Uuid,
        client: &ClientMeta,
    ) -> AppResult<(String, RefreshTokenRecord)> {
        let secret = generate_refresh_secret();
        let expires_at: DateTime<Utc> = expires_after(Utc::now(), self.refresh_ttl)?;
        let record = tx
            .insert_refresh_token(&NewRefreshToken {
                user_id,
                family_id,
                token_hash: hash_refresh_secret(&secret),
                expires_at,
                client: client.clone(),
            })
            .await?;
        Ok((secret, record))
    }

    /// Best effort; callers log and ignore failures.
    async fn mark_last_login(&self, user_id: Uuid) -> AppResult<()> {
        self.with_deadline("mark_last_login", async {
            let mut tx = self.store.begin().await?;
            tx.mark_last_login(user_id).await?;
            tx.commit().await
        })
        .await
    }

    /// Bound `fut` by the operation timeout. On expiry the future is dropped,
    /// which drops any open transaction and rolls it back.
    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        tokio::time::timeout(self.operation_timeout, fut)
            .await
            .map_err(|_| {
                warn!(operation, timeout = ?self.operation_timeout, "Session operation timed out");
                AppError::store_unavailable(format!(
                    "{operation} did not complete within {:?}",
                    self.operation_timeout
                ))
            })?
    }
}
