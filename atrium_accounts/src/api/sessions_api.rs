use std::fmt::Debug;

use crate::{
    db_types::{NewSessionRecord, SessionRecord, TokenId},
    traits::{SessionApiError, SessionManagement},
};

pub struct SessionApi<B> {
    db: B,
}

impl<B: Debug> Debug for SessionApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionApi ({:?})", self.db)
    }
}

impl<B> SessionApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> SessionApi<B>
where
    B: SessionManagement,
{
    pub async fn create_session(&self, session: NewSessionRecord) -> Result<(), SessionApiError> {
        self.db.create_session(session).await
    }

    pub async fn fetch_session(&self, token_id: &TokenId) -> Result<Option<SessionRecord>, SessionApiError> {
        self.db.fetch_session(token_id).await
    }

    pub async fn revoke_session(&self, token_id: &TokenId) -> Result<(), SessionApiError> {
        self.db.revoke_session(token_id).await
    }

    pub async fn revoke_sessions_for_user(&self, user_id: i64) -> Result<u64, SessionApiError> {
        self.db.revoke_sessions_for_user(user_id).await
    }

    pub async fn delete_expired_sessions(&self) -> Result<u64, SessionApiError> {
        self.db.delete_expired_sessions().await
    }
}
