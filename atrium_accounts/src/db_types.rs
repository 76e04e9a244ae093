use std::{
    fmt::{self, Debug, Display},
    str::FromStr,
};

use abo_common::Secret;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

//--------------------------------------        Role        ---------------------------------------------------------
/// The set of roles a principal can hold. Stored users carry an `is_admin` flag; the claim set
/// expands it so that new roles can be added without changing the token format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Every authenticated principal.
    User,
    /// May manage users and force-revoke sessions.
    Admin,
}

pub type Roles = Vec<Role>;

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid role: {0}")]
pub struct RoleParseError(String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            s => Err(RoleParseError(s.to_string())),
        }
    }
}

//--------------------------------------       TokenId      ---------------------------------------------------------
/// The unique identifier minted into every access token (the `jti` claim). Session records are
/// keyed on it, which is what makes server-side revocation of individual tokens possible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

//--------------------------------------      UserRecord     ---------------------------------------------------------
/// A stored user, as read from the `users` table. The password hash never leaves the engine:
/// this type is neither serializable nor does its `Debug` impl print the hash.
#[derive(Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub hashed_password: String,
    pub is_admin: bool,
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// The roles this user is entitled to have signed into an access token.
    pub fn roles(&self) -> Roles {
        if self.is_admin {
            vec![Role::User, Role::Admin]
        } else {
            vec![Role::User]
        }
    }
}

impl Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("hashed_password", &"****")
            .field("is_admin", &self.is_admin)
            .field("password_changed_at", &self.password_changed_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

//--------------------------------------       NewUser       ---------------------------------------------------------
/// Input for creating a user via [`crate::AuthApi::create_user`]. Carries the plaintext password
/// (masked in logs); the engine hashes it before it reaches a backend.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    pub password: Secret<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Input for [`crate::traits::UserManagement::create_user`]. By the time a user reaches a
/// backend, only the hash of the password remains.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub hashed_password: String,
    pub is_admin: bool,
}

//--------------------------------------     UserProfile     ---------------------------------------------------------
/// The projection of a user that is safe to return to HTTP callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub is_admin: bool,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            is_admin: user.is_admin,
        }
    }
}

//--------------------------------------    SessionRecord    ---------------------------------------------------------
/// The persisted record backing an issued access token. Created at login, mutated only to flip
/// `revoked`, and read on every request when session tracking is enabled. The primary key on
/// `token_id` guarantees at most one record per token.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRecord {
    pub token_id: TokenId,
    pub user_id: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl SessionRecord {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    /// A session backs a token only while it is neither revoked nor expired.
    pub fn is_live(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}

/// Input for [`crate::traits::SessionManagement::create_session`].
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    pub token_id: TokenId,
    pub user_id: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
