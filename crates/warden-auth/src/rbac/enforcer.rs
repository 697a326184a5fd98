//! Scope checks for authenticated requests.

use warden_core::error::AppError;

use crate::jwt::{Claims, JwtDecoder};

/// Authenticates bearer tokens and checks their permission scope.
#[derive(Debug, Clone)]
pub struct PermissionEnforcer {
    decoder: JwtDecoder,
}

impl PermissionEnforcer {
    pub fn new(decoder: JwtDecoder) -> Self {
        Self { decoder }
    }

    /// Parse an `Authorization` header value of the form `Bearer <token>`.
    ///
    /// The scheme is matched case-insensitively.
    pub fn authenticate(&self, header: Option<&str>) -> Result<Claims, AppError> {
        let header = header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::invalid_token("Missing authorization header"))?;

        let token = match header.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
            _ => return Err(AppError::invalid_token("Expected a bearer token")),
        };
        if token.is_empty() {
            return Err(AppError::invalid_token("Expected a bearer token"));
        }

        self.decoder.parse_access_token(token)
    }

    /// Require `code` to be in the token scope.
    pub fn require_permission(&self, claims: &Claims, code: &str) -> Result<(), AppError> {
        if claims.has_permission(code) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Missing permission '{code}'")))
        }
    }

    /// Require at least one of `codes` to be in the token scope.
    pub fn require_any(&self, claims: &Claims, codes: &[&str]) -> Result<(), AppError> {
        if codes.iter().any(|code| claims.has_permission(code)) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Missing any of the permissions [{}]",
                codes.join(", ")
            )))
        }
    }
}
