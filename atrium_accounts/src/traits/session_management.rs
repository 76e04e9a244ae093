use thiserror::Error;

use crate::db_types::{NewSessionRecord, SessionRecord, TokenId};

#[derive(Debug, Clone, Error)]
pub enum SessionApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Session not found")]
    SessionNotFound,
}

/// The `SessionManagement` trait defines the session-record bookkeeping for server-side token
/// revocation.
///
/// Records are keyed by the token id (`jti` claim) of the access token they back. Verification
/// remains a pure function of the token and the signing key; these records are consulted as a
/// separate, stateful layer so that a token can be killed before its natural expiry. Lookups must
/// be cheap: they run on every authenticated request when session tracking is enabled.
#[allow(async_fn_in_trait)]
pub trait SessionManagement {
    /// Records a newly issued token. The token id is unique; inserting a duplicate is a backend
    /// error.
    async fn create_session(&self, session: NewSessionRecord) -> Result<(), SessionApiError>;

    /// Fetches the session record backing the given token id, if any.
    async fn fetch_session(&self, token_id: &TokenId) -> Result<Option<SessionRecord>, SessionApiError>;

    /// Marks a single session as revoked. Returns [`SessionApiError::SessionNotFound`] when no
    /// record exists for the token id. Revoking an already revoked session succeeds.
    async fn revoke_session(&self, token_id: &TokenId) -> Result<(), SessionApiError>;

    /// Revokes every live session belonging to the given user (logout-everywhere, password
    /// change, admin-forced invalidation). Returns the number of sessions actually revoked.
    async fn revoke_sessions_for_user(&self, user_id: i64) -> Result<u64, SessionApiError>;

    /// Deletes records whose tokens have expired anyway. Housekeeping only: an expired record
    /// that has not been cleaned up yet must still be rejected by callers.
    async fn delete_expired_sessions(&self) -> Result<u64, SessionApiError>;
}
