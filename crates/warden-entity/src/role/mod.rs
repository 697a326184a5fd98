//! Role domain entities.

pub mod model;

pub use model::{NewRole, OWNER_ROLE_NAME, Role};
