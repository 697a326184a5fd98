//! # warden-auth
//!
//! Session and access-control engine for Warden.
//!
//! ## Modules
//!
//! - `jwt`: signed access tokens carrying identity, role set and permission scope
//! - `refresh`: opaque refresh secrets and their storage digests
//! - `password`: Argon2id hashing and password policy
//! - `rbac`: permission resolution, the single-owner guard, owner bootstrap and scope checks
//! - `session`: login, refresh rotation with reuse detection, logout

pub mod jwt;
pub mod password;
pub mod rbac;
pub mod refresh;
pub mod session;

pub use jwt::{AccessToken, Claims, JwtDecoder, JwtEncoder};
pub use password::{PasswordHasher, PasswordValidator};
pub use rbac::{
    BootstrapReport, OwnerBootstrap, OwnerGuard, PermissionEnforcer, PermissionResolver,
    ResolvedPermissions,
};
pub use session::{SessionManager, SessionResult};
