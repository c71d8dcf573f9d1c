use anyhow::Result;
use async_trait::async_trait;

use shared_models::auth::User;

use crate::Database;

/// Read access to stored accounts, as needed by the credential verifier.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
impl UserStore for Database {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self.users.find(|u| u.email == email).await)
    }
}
