//! SQLite database operations for user records.
//!
//! Generally clients should never call these methods directly, and prefer to use the
//! [`UserManagement`](crate::traits::UserManagement) trait methods implemented on the
//! [`SqliteDatabase`](crate::SqliteDatabase) struct instead.

use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUserRecord, UserRecord},
    traits::UserApiError,
};

const USER_COLUMNS: &str = "id, username, email, full_name, hashed_password, is_admin, password_changed_at, created_at";

pub async fn fetch_user_by_identifier(
    identifier: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserRecord>, UserApiError> {
    let q = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ? LIMIT 1");
    let user = sqlx::query_as::<_, UserRecord>(&q).bind(identifier).bind(identifier).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<UserRecord>, UserApiError> {
    let q = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let user = sqlx::query_as::<_, UserRecord>(&q).bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_users(conn: &mut SqliteConnection) -> Result<Vec<UserRecord>, UserApiError> {
    let q = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
    let users = sqlx::query_as::<_, UserRecord>(&q).fetch_all(conn).await?;
    Ok(users)
}

pub async fn insert_user(user: NewUserRecord, conn: &mut SqliteConnection) -> Result<UserRecord, UserApiError> {
    let q = format!(
        "INSERT INTO users (username, email, full_name, hashed_password, is_admin) VALUES (?, ?, ?, ?, ?) RETURNING \
         {USER_COLUMNS}"
    );
    sqlx::query_as::<_, UserRecord>(&q)
        .bind(user.username)
        .bind(user.email)
        .bind(user.full_name)
        .bind(user.hashed_password)
        .bind(user.is_admin)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref de) = e {
                if matches!(de.kind(), sqlx::error::ErrorKind::UniqueViolation) {
                    return UserApiError::DuplicateUser(de.message().to_string());
                }
            }
            UserApiError::from(e)
        })
}

pub async fn update_password(
    user_id: i64,
    hashed_password: &str,
    conn: &mut SqliteConnection,
) -> Result<(), UserApiError> {
    let res = sqlx::query("UPDATE users SET hashed_password = ?, password_changed_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(hashed_password)
        .bind(user_id)
        .execute(conn)
        .await?;
    match res.rows_affected() {
        0 => Err(UserApiError::UserNotFound),
        1 => Ok(()),
        _ => unreachable!("Updating a password should only affect one row"),
    }
}
