use std::env;
use std::str::FromStr;
use tracing::warn;

const DEFAULT_ACCESS_TOKEN_TTL: i64 = 60 * 60;
const DEFAULT_REFRESH_TOKEN_TTL: i64 = 7 * 24 * 60 * 60;
const DEFAULT_PASSWORD_HASH_COST: u32 = 2;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_ttl: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl: i64,
    /// Argon2 time cost used for new password hashes.
    pub password_hash_cost: u32,
    pub rate_limit_per_minute: u32,
    pub login_rate_limit_per_minute: u32,
    /// Key rate limits on `X-Forwarded-For`/`X-Real-IP`. Only enable behind a
    /// proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingSecret(&'static str),

    #[error("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ")]
    SharedSecret,

    #[error("{0} must be positive")]
    NonPositive(&'static str),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000),
            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .unwrap_or_else(|_| {
                    warn!("ACCESS_TOKEN_SECRET not set, using empty value");
                    String::new()
                }),
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .unwrap_or_else(|_| {
                    warn!("REFRESH_TOKEN_SECRET not set, using empty value");
                    String::new()
                }),
            access_token_ttl: parse_or("ACCESS_TOKEN_TTL", DEFAULT_ACCESS_TOKEN_TTL),
            refresh_token_ttl: parse_or("REFRESH_TOKEN_TTL", DEFAULT_REFRESH_TOKEN_TTL),
            password_hash_cost: parse_or("PASSWORD_HASH_COST", DEFAULT_PASSWORD_HASH_COST),
            rate_limit_per_minute: parse_or("RATE_LIMIT_PER_MINUTE", 100),
            login_rate_limit_per_minute: parse_or("LOGIN_RATE_LIMIT_PER_MINUTE", 5),
            trust_proxy_headers: parse_or("TRUST_PROXY_HEADERS", false),
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
            admin_name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrador".to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing token secrets");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.access_token_secret.is_empty() && !self.refresh_token_secret.is_empty()
    }

    /// Rejects configurations the token service cannot run safely with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.is_empty() {
            return Err(ConfigError::MissingSecret("ACCESS_TOKEN_SECRET"));
        }
        if self.refresh_token_secret.is_empty() {
            return Err(ConfigError::MissingSecret("REFRESH_TOKEN_SECRET"));
        }
        if self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }
        if self.access_token_ttl <= 0 {
            return Err(ConfigError::NonPositive("ACCESS_TOKEN_TTL"));
        }
        if self.refresh_token_ttl <= 0 {
            return Err(ConfigError::NonPositive("REFRESH_TOKEN_TTL"));
        }
        if self.password_hash_cost == 0 {
            return Err(ConfigError::NonPositive("PASSWORD_HASH_COST"));
        }
        Ok(())
    }

    pub fn has_bootstrap_admin(&self) -> bool {
        self.admin_email.is_some() && self.admin_password.is_some()
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
