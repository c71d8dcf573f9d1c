use std::sync::Arc;

use tracing::warn;

use shared_config::AppConfig;
use shared_database::Database;

use crate::jwt::TokenService;
use crate::password::{dummy_password_hash, DUMMY_PASSWORD_HASH};
use crate::rate_limit::RateLimiter;

/// Router state shared by every cell.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<Database>,
    pub tokens: Arc<TokenService>,
    /// Stand-in hash for unknown accounts, built with the configured cost.
    pub dummy_password_hash: Arc<str>,
    pub login_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_database(config, Arc::new(Database::new()))
    }

    pub fn with_database(config: AppConfig, db: Arc<Database>) -> Self {
        let tokens = Arc::new(TokenService::new(&config));
        let dummy = dummy_password_hash(config.password_hash_cost).unwrap_or_else(|e| {
            warn!("Cannot build dummy hash at cost {}: {}", config.password_hash_cost, e);
            DUMMY_PASSWORD_HASH.to_string()
        });
        let login_limiter = RateLimiter::new(config.login_rate_limit_per_minute)
            .trust_proxy_headers(config.trust_proxy_headers);

        Self {
            config: Arc::new(config),
            db,
            tokens,
            dummy_password_hash: dummy.into(),
            login_limiter,
        }
    }
}
