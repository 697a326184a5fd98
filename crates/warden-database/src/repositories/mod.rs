//! PostgreSQL statements, grouped per table.
//!
//! Each function runs on a borrowed connection so callers decide the
//! transaction boundary.

pub mod permission;
pub mod refresh_token;
pub mod role;
pub mod user;

use warden_core::error::{AppError, ErrorKind};

/// Convert a sqlx error into the store taxonomy.
///
/// Unique-key violations become `Conflict`; everything else is `StoreUnavailable`.
pub(crate) fn store_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let unique = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
        if unique {
            AppError::with_source(ErrorKind::Conflict, format!("{message}: duplicate value"), e)
        } else {
            AppError::with_source(ErrorKind::StoreUnavailable, message, e)
        }
    }
}
