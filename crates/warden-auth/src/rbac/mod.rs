//! Role-based access control: permission resolution, the single-owner
//! guard, owner bootstrap, and scope enforcement.

pub mod bootstrap;
pub mod enforcer;
pub mod guard;
pub mod resolver;

pub use bootstrap::{BootstrapReport, OwnerBootstrap};
pub use enforcer::PermissionEnforcer;
pub use guard::OwnerGuard;
pub use resolver::{PermissionResolver, ResolvedPermissions};
