//! User domain entities.

pub mod model;
pub mod status;

pub use model::{NewUser, User, UserProfile, normalize_email};
pub use status::UserStatus;
