use std::sync::Arc;

use tracing::{debug, error, info};

use shared_database::UserStore;
use shared_models::auth::UserIdentity;
use shared_models::error::AppError;
use shared_utils::password::verify_password;

/// Checks an email/password pair against the stored account.
///
/// An unknown email and a wrong password fail identically, and both run one
/// hash comparison. `dummy_hash` must be made with the same cost as stored
/// hashes for the two paths to take the same time.
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn UserStore>,
    dummy_hash: Arc<str>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn UserStore>, dummy_hash: Arc<str>) -> Self {
        Self { store, dummy_hash }
    }

    pub async fn verify(&self, email: &str, password: &str) -> Result<UserIdentity, AppError> {
        debug!("Verifying credentials for {}", email);

        let user = self.store.find_user_by_email(email).await.map_err(|e| {
            error!("User lookup failed: {}", e);
            AppError::Internal(e.to_string())
        })?;

        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.to_string());
        let password = password.to_string();

        let matched = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password check panicked: {}", e)))?
            .map_err(|e| AppError::Internal(e.to_string()))?;

        match user {
            Some(user) if matched => {
                info!("User {} authenticated", user.id);
                Ok(user.identity())
            }
            _ => {
                debug!("Rejected credentials for {}", email);
                Err(AppError::InvalidCredentials)
            }
        }
    }
}
