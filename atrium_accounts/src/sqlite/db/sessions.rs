//! SQLite database operations for session records.
//!
//! Generally clients should never call these methods directly, and prefer to use the
//! [`SessionManagement`](crate::traits::SessionManagement) trait methods implemented on the
//! [`SqliteDatabase`](crate::SqliteDatabase) struct instead.

use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewSessionRecord, SessionRecord, TokenId},
    traits::SessionApiError,
};

pub async fn insert_session(session: NewSessionRecord, conn: &mut SqliteConnection) -> Result<(), SessionApiError> {
    sqlx::query("INSERT INTO sessions (token_id, user_id, issued_at, expires_at) VALUES (?, ?, ?, ?)")
        .bind(session.token_id)
        .bind(session.user_id)
        .bind(session.issued_at)
        .bind(session.expires_at)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_session(
    token_id: &TokenId,
    conn: &mut SqliteConnection,
) -> Result<Option<SessionRecord>, SessionApiError> {
    let session = sqlx::query_as::<_, SessionRecord>(
        "SELECT token_id, user_id, issued_at, expires_at, revoked FROM sessions WHERE token_id = ?",
    )
    .bind(token_id.clone())
    .fetch_optional(conn)
    .await?;
    Ok(session)
}

pub async fn revoke_session(token_id: &TokenId, conn: &mut SqliteConnection) -> Result<(), SessionApiError> {
    let res =
        sqlx::query("UPDATE sessions SET revoked = 1 WHERE token_id = ?").bind(token_id.clone()).execute(conn).await?;
    match res.rows_affected() {
        0 => Err(SessionApiError::SessionNotFound),
        1 => Ok(()),
        _ => unreachable!("token_id is the primary key, so at most one row can be affected"),
    }
}

pub async fn revoke_sessions_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, SessionApiError> {
    let res = sqlx::query("UPDATE sessions SET revoked = 1 WHERE user_id = ? AND revoked = 0")
        .bind(user_id)
        .execute(conn)
        .await?;
    debug!("🗃️ Revoked {} session(s) for user {user_id}", res.rows_affected());
    Ok(res.rows_affected())
}

pub async fn delete_expired_sessions(conn: &mut SqliteConnection) -> Result<u64, SessionApiError> {
    let now = Utc::now();
    let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?").bind(now).execute(conn).await?;
    Ok(res.rows_affected())
}
