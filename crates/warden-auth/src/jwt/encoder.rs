//! Access token creation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use warden_core::config::AuthConfig;
use warden_core::error::AppError;

use super::claims::Claims;

/// The only algorithm tokens are signed with and accepted under.
pub(crate) const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// A freshly signed access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Compact JWS string.
    pub token: String,
    /// Token ID (`jti`).
    pub jti: Uuid,
    /// Expiry, truncated to whole seconds like the `exp` claim.
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whole seconds remaining at the moment of the call.
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Signs access tokens with the server-held HMAC secret.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    default_ttl: Duration,
    max_ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("default_ttl", &self.default_ttl)
            .field("max_ttl", &self.max_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtEncoder {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            default_ttl: config.access_token_ttl(),
            max_ttl: config.max_access_token_ttl(),
        }
    }

    /// Configured access token lifetime.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `user_id` valid for `ttl`.
    ///
    /// A TTL above the configured ceiling is refused.
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        role_ids: &[Uuid],
        scope: &[String],
        ttl: Duration,
    ) -> Result<AccessToken, AppError> {
        self.issue_at(Utc::now(), user_id, role_ids, scope, ttl)
    }

    pub(crate) fn issue_at(
        &self,
        now: DateTime<Utc>,
        user_id: Uuid,
        role_ids: &[Uuid],
        scope: &[String],
        ttl: Duration,
    ) -> Result<AccessToken, AppError> {
        if ttl > self.max_ttl {
            return Err(AppError::configuration(format!(
                "Access token TTL of {}s exceeds the {}s ceiling",
                ttl.as_secs(),
                self.max_ttl.as_secs()
            )));
        }

        let expires = expires_after(now, ttl)?;
        let claims = Claims {
            sub: user_id,
            role_ids: role_ids.to_vec(),
            scope: scope.to_vec(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| {
                AppError::with_source(
                    warden_core::ErrorKind::Internal,
                    "Failed to encode access token",
                    e,
                )
            })?;

        Ok(AccessToken {
            token,
            jti: claims.jti,
            expires_at: claims.expires_at(),
        })
    }
}

/// `now + ttl`, or a configuration error when the sum is not representable.
pub(crate) fn expires_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, AppError> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| AppError::configuration("Token TTL is out of range"))
}
