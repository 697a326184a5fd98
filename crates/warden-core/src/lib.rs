//! # warden-core
//!
//! Core crate for Warden. Contains the configuration schemas, the
//! unified error taxonomy, and the result alias shared by every other
//! crate in the workspace.
//!
//! This crate has **no** internal dependencies on other Warden crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
