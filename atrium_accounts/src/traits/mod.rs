//! Backend interface contracts for the accounts engine.
//!
//! This module defines the behaviour a storage backend must expose in order to be supported by
//! the Atrium server.
//!
//! * [`UserManagement`] provides the user lookups and mutations that authentication needs:
//!   lookup by identifier or id, creation, and password updates.
//! * [`SessionManagement`] provides the session-record bookkeeping that makes server-side token
//!   revocation possible.
//!
//! The auth core never implements its own locking; every method here is a single-row (or
//! single-statement) operation that the backend must make atomic at the storage layer.
mod session_management;
mod user_management;

pub use session_management::{SessionApiError, SessionManagement};
pub use user_management::{UserApiError, UserManagement};
