//! `SqliteDatabase` is a concrete implementation of an Atrium accounts backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the traits defined in the
//! [`traits`](crate::traits) module by delegating to the free functions in [`super::db`].
use std::fmt::Debug;

use sqlx::SqlitePool;

use super::db::{db_url, new_pool, sessions, users};
use crate::{
    db_types::{NewSessionRecord, NewUserRecord, SessionRecord, TokenId, UserRecord},
    traits::{SessionApiError, SessionManagement, UserApiError, UserManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a database instance using the URL from `ABO_DATABASE_URL`, or the default.
    pub async fn new_default(max_connections: u32) -> Result<Self, sqlx::Error> {
        Self::new_with_url(&db_url(), max_connections).await
    }

    /// Creates a new database instance with a connection pool of the given maximum size.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await
    }
}

impl UserManagement for SqliteDatabase {
    async fn fetch_user_by_identifier(&self, identifier: &str) -> Result<Option<UserRecord>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_identifier(identifier, &mut conn).await
    }

    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_id(id, &mut conn).await
    }

    async fn fetch_users(&self) -> Result<Vec<UserRecord>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_users(&mut conn).await
    }

    async fn create_user(&self, user: NewUserRecord) -> Result<UserRecord, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn update_password(&self, user_id: i64, hashed_password: &str) -> Result<(), UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::update_password(user_id, hashed_password, &mut conn).await
    }
}

impl SessionManagement for SqliteDatabase {
    async fn create_session(&self, session: NewSessionRecord) -> Result<(), SessionApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::insert_session(session, &mut conn).await
    }

    async fn fetch_session(&self, token_id: &TokenId) -> Result<Option<SessionRecord>, SessionApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::fetch_session(token_id, &mut conn).await
    }

    async fn revoke_session(&self, token_id: &TokenId) -> Result<(), SessionApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::revoke_session(token_id, &mut conn).await
    }

    async fn revoke_sessions_for_user(&self, user_id: i64) -> Result<u64, SessionApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::revoke_sessions_for_user(user_id, &mut conn).await
    }

    async fn delete_expired_sessions(&self) -> Result<u64, SessionApiError> {
        let mut conn = self.pool.acquire().await?;
        sessions::delete_expired_sessions(&mut conn).await
    }
}
