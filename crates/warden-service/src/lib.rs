//! # warden-service
//!
//! User- and role-management services. Every mutation of user↔role or
//! role↔permission assignments goes through these services, which run the
//! owner guard inside the same transaction as the write.
//!
//! Services follow constructor injection: all dependencies are provided at
//! construction time via `Arc` references.

pub mod context;
pub mod role;
pub mod user;

pub use context::RequestContext;
pub use role::RoleService;
pub use user::{CreateUserRequest, UserAdminService};
