//! Unified application error types for Warden.
//!
//! Every failure the session and access-control engine can report is an
//! [`AppError`] tagged with an [`ErrorKind`]. The transport layer matches on
//! the kind to pick a response; the message is for operators and logs.

use std::fmt;
use thiserror::Error;

/// Error categories reported across the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Unknown email, or the password does not match.
    InvalidCredentials,
    /// The credentials matched but the account is not active.
    UserNotActive,
    /// A refresh was requested without presenting a refresh secret.
    MissingRefreshToken,
    /// The presented refresh secret does not resolve to any record.
    InvalidRefreshToken,
    /// An already-rotated refresh secret was presented again.
    RefreshTokenReuse,
    /// The presented refresh secret is past its expiry.
    RefreshTokenExpired,
    /// The authenticated user no longer resolves.
    UserNotFound,
    /// The access token failed signature, algorithm, structure, or expiry checks.
    InvalidToken,
    /// A role assignment would break the single-owner invariant.
    InvariantViolation,
    /// The persistent store failed or timed out.
    StoreUnavailable,
    /// The token scope lacks a required permission.
    Forbidden,
    /// An addressed record does not exist.
    NotFound,
    /// A uniqueness or system-record conflict.
    Conflict,
    /// Input validation failed.
    Validation,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Returns the stable machine-readable code for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::UserNotActive => "USER_NOT_ACTIVE",
            Self::MissingRefreshToken => "MISSING_REFRESH_TOKEN",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::RefreshTokenReuse => "REFRESH_TOKEN_REUSE",
            Self::RefreshTokenExpired => "REFRESH_TOKEN_EXPIRED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvariantViolation => "INVARIANT_VIOLATION",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Validation => "VALIDATION",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether this kind should make the transport layer discard the
    /// client's refresh credential.
    pub fn clears_refresh_credential(&self) -> bool {
        matches!(
            self,
            Self::RefreshTokenReuse | Self::RefreshTokenExpired | Self::InvalidRefreshToken
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unified application error used throughout Warden.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns `true` when this error is of the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Invalid email or password")
    }

    pub fn user_not_active(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserNotActive, message)
    }

    pub fn missing_refresh_token() -> Self {
        Self::new(ErrorKind::MissingRefreshToken, "Missing refresh token")
    }

    pub fn invalid_refresh_token() -> Self {
        Self::new(ErrorKind::InvalidRefreshToken, "Invalid refresh token")
    }

    pub fn refresh_token_reuse() -> Self {
        Self::new(ErrorKind::RefreshTokenReuse, "Refresh token reuse detected")
    }

    pub fn refresh_token_expired() -> Self {
        Self::new(ErrorKind::RefreshTokenExpired, "Refresh token expired")
    }

    pub fn user_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UserNotFound, message)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidToken, message)
    }

    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvariantViolation, message)
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreUnavailable, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
