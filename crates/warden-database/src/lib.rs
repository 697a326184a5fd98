//! # warden-database
//!
//! Transactional store abstraction for users, roles, permissions and
//! refresh-token records, with a PostgreSQL implementation and an in-memory
//! implementation used by the test suites.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{IdentityStore, MemoryIdentityStore, PgIdentityStore, StoreTransaction};
