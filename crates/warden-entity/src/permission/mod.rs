//! Permission domain entities.

pub mod model;

pub use model::{Permission, PermissionGrant};
