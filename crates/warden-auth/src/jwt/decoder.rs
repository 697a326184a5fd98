//! Access token validation.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{DecodingKey, Validation, decode};

use warden_core::config::AuthConfig;
use warden_core::error::AppError;

use super::claims::Claims;
use super::encoder::SIGNING_ALGORITHM;

/// Verifies signature, algorithm, structure and expiry of access tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl JwtDecoder {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = config.token_leeway_seconds;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Parse and validate an access token.
    ///
    /// Every failure is reported as `InvalidToken`.
    pub fn parse_access_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    JwtErrorKind::ExpiredSignature => "Token has expired",
                    JwtErrorKind::InvalidSignature => "Invalid token signature",
                    JwtErrorKind::InvalidAlgorithm => "Unexpected token algorithm",
                    JwtErrorKind::MissingRequiredClaim(_) => "Token is missing a required claim",
                    _ => "Malformed token",
                };
                AppError::with_source(warden_core::ErrorKind::InvalidToken, reason, e)
            })
    }
}
