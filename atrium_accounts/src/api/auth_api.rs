use std::fmt::Debug;

use log::debug;

use crate::{
    db_types::{NewUser, NewUserRecord, UserRecord},
    helpers::{hash_password, verify_against_dummy, verify_password},
    traits::{SessionManagement, UserApiError, UserManagement},
};

pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where
    B: UserManagement,
{
    /// Checks the given credentials and returns the matching user.
    ///
    /// Both an unknown identifier and a wrong password return
    /// [`UserApiError::InvalidCredentials`], and the unknown-identifier path still burns a full
    /// hash verification, so the two failures are indistinguishable in response and in timing.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<UserRecord, UserApiError> {
        match self.db.fetch_user_by_identifier(identifier).await? {
            Some(user) => {
                let matches = verify_password(&user.hashed_password, password)
                    .map_err(|e| UserApiError::HashingError(e.to_string()))?;
                if matches {
                    Ok(user)
                } else {
                    debug!("🔑️ Password mismatch for {identifier}");
                    Err(UserApiError::InvalidCredentials)
                }
            },
            None => {
                verify_against_dummy(password);
                debug!("🔑️ No user found for {identifier}");
                Err(UserApiError::InvalidCredentials)
            },
        }
    }

    /// Hashes the password and stores the new user.
    pub async fn create_user(&self, user: NewUser) -> Result<UserRecord, UserApiError> {
        let hashed_password =
            hash_password(user.password.reveal()).map_err(|e| UserApiError::HashingError(e.to_string()))?;
        let record = NewUserRecord {
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            hashed_password,
            is_admin: user.is_admin,
        };
        self.db.create_user(record).await
    }
}

impl<B> AuthApi<B>
where
    B: UserManagement + SessionManagement,
{
    /// Verifies the old password, stores a hash of the new one, and revokes every live session
    /// belonging to the user. Returns the number of sessions revoked.
    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<u64, UserApiError> {
        let user = self.db.fetch_user_by_id(user_id).await?.ok_or(UserApiError::UserNotFound)?;
        let matches = verify_password(&user.hashed_password, old_password)
            .map_err(|e| UserApiError::HashingError(e.to_string()))?;
        if !matches {
            return Err(UserApiError::InvalidCredentials);
        }
        let hashed = hash_password(new_password).map_err(|e| UserApiError::HashingError(e.to_string()))?;
        self.db.update_password(user_id, &hashed).await?;
        let revoked = self
            .db
            .revoke_sessions_for_user(user_id)
            .await
            .map_err(|e| UserApiError::DatabaseError(e.to_string()))?;
        debug!("🔑️ Password changed for user {user_id}. {revoked} session(s) revoked");
        Ok(revoked)
    }
}
