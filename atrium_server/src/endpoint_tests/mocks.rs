use atrium_accounts::{
    db_types::{NewSessionRecord, NewUserRecord, SessionRecord, TokenId, UserRecord},
    SessionApiError,
    SessionManagement,
    UserApiError,
    UserManagement,
};
use mockall::mock;

mock! {
    pub Backend {}
    impl UserManagement for Backend {
        async fn fetch_user_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, UserApiError>;
        async fn fetch_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, UserApiError>;
        async fn fetch_users(&self) -> Result<Vec<UserRecord>, UserApiError>;
        async fn create_user(&self, user: NewUserRecord) -> Result<UserRecord, UserApiError>;
        async fn update_password(&self, user_id: i64, hashed_password: &str) -> Result<(), UserApiError>;
    }
    impl SessionManagement for Backend {
        async fn create_session(&self, session: NewSessionRecord) -> Result<(), SessionApiError>;
        async fn fetch_session(&self, token_id: &TokenId) -> Result<Option<SessionRecord>, SessionApiError>;
        async fn revoke_session(&self, token_id: &TokenId) -> Result<(), SessionApiError>;
        async fn revoke_sessions_for_user(&self, user_id: i64) -> Result<u64, SessionApiError>;
        async fn delete_expired_sessions(&self) -> Result<u64, SessionApiError>;
    }
}
