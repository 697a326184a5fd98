//! Session lifecycle: login, refresh rotation, logout.

pub mod manager;
pub mod result;

pub use manager::SessionManager;
pub use result::SessionResult;
