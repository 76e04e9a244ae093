//! The engine public API.
//!
//! Thin wrappers over a backend `B`, one per concern. The server constructs one of each per
//! worker and stores them in app data; handlers never talk to a backend directly.
mod accounts_api;
mod auth_api;
mod sessions_api;

pub use accounts_api::AccountApi;
pub use auth_api::AuthApi;
pub use sessions_api::SessionApi;
