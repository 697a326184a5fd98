//! # warden-entity
//!
//! Domain entity models for Warden. Every struct in this crate represents a
//! database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`.

pub mod permission;
pub mod role;
pub mod session;
pub mod user;

pub use permission::{Permission, PermissionGrant};
pub use role::{NewRole, OWNER_ROLE_NAME, Role};
pub use session::{ClientMeta, NewRefreshToken, RefreshTokenRecord, RefreshTokenState};
pub use user::{NewUser, User, UserProfile, UserStatus};
