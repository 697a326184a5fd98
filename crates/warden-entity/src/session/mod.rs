//! Refresh-token session entities.

pub mod refresh_token;

pub use refresh_token::{ClientMeta, NewRefreshToken, RefreshTokenRecord, RefreshTokenState};
