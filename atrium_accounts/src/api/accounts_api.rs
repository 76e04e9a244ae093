use std::fmt::Debug;

use crate::{
    db_types::{UserProfile, UserRecord},
    traits::{UserApiError, UserManagement},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AccountApi<B>
where
    B: UserManagement,
{
    pub async fn fetch_user(&self, user_id: i64) -> Result<Option<UserRecord>, UserApiError> {
        self.db.fetch_user_by_id(user_id).await
    }

    pub async fn profile_for_user(&self, user_id: i64) -> Result<Option<UserProfile>, UserApiError> {
        let user = self.db.fetch_user_by_id(user_id).await?;
        Ok(user.as_ref().map(UserProfile::from))
    }

    pub async fn all_profiles(&self) -> Result<Vec<UserProfile>, UserApiError> {
        let users = self.db.fetch_users().await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }
}
