//! Role and grant management.

pub mod service;

pub use service::RoleService;
