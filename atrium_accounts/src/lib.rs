//! Atrium Accounts Engine
//!
//! This library contains the account and session management core for the Atrium back office. It is
//! HTTP-framework agnostic and is divided into three main sections:
//! 1. The backend traits ([`mod@traits`]). A storage backend must implement [`UserManagement`] and
//!    [`SessionManagement`] in order to act as a backend for the Atrium server. SQLite is the
//!    supported backend ([`SqliteDatabase`]); you should never need to access the database
//!    directly. The data types used by the backends are defined in [`mod@db_types`] and are
//!    public.
//! 2. The engine public API ([`mod@api`]). Thin wrappers over a backend that implement the
//!    behaviour the server composes: credential checks with anti-enumeration timing, user
//!    profile queries and session revocation bookkeeping.
//! 3. Helpers ([`mod@helpers`]), most importantly the password hashing and verification
//!    primitives.
mod api;
mod sqlite;

pub mod db_types;
pub mod helpers;
pub mod traits;

pub use api::{AccountApi, AuthApi, SessionApi};
pub use sqlite::SqliteDatabase;
pub use traits::{SessionApiError, SessionManagement, UserApiError, UserManagement};
