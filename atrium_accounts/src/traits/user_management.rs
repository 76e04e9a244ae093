use thiserror::Error;

use crate::db_types::{NewUserRecord, UserRecord};

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User not found")]
    UserNotFound,
    #[error("A user with those details already exists")]
    DuplicateUser(String),
    #[error("Invalid username/email or password")]
    InvalidCredentials,
    #[error("Password hash error. {0}")]
    HashingError(String),
}

/// The `UserManagement` trait defines the user lookups and mutations the authentication core
/// needs from a storage backend.
///
/// Identifiers are opaque to the engine: `fetch_user_by_identifier` must match either the
/// username or the email address, since callers log in with either. Lookups return `Ok(None)`
/// for missing users; only [`UserApiError::DatabaseError`] signals that the store itself failed.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Fetches the user whose username **or** email equals `identifier`.
    async fn fetch_user_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, UserApiError>;

    /// Fetches a user by primary key.
    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, UserApiError>;

    /// Fetches all users, ordered by id.
    async fn fetch_users(&self) -> Result<Vec<UserRecord>, UserApiError>;

    /// Creates a new user and returns the stored record. A username or email collision returns
    /// [`UserApiError::DuplicateUser`].
    async fn create_user(&self, user: NewUserRecord) -> Result<UserRecord, UserApiError>;

    /// Replaces the stored password hash and bumps `password_changed_at`. Returns
    /// [`UserApiError::UserNotFound`] if the user does not exist.
    async fn update_password(&self, user_id: i64, hashed_password: &str) -> Result<(), UserApiError>;
}
