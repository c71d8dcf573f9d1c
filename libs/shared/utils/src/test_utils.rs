use std::sync::atomic::{AtomicI64, Ordering};

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Database;
use shared_models::auth::{Role, User, UserIdentity};

use crate::password::hash_password;
use crate::state::AppState;

// Far above any id a test database hands out.
static NEXT_TEST_USER_ID: AtomicI64 = AtomicI64::new(10_000);

pub struct TestConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub rate_limit_per_minute: u32,
    pub login_rate_limit_per_minute: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            access_secret: "test-access-secret-key-for-token-validation".to_string(),
            refresh_secret: "test-refresh-secret-key-for-token-rotation".to_string(),
            rate_limit_per_minute: 1000,
            login_rate_limit_per_minute: 1000,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            access_token_secret: self.access_secret.clone(),
            refresh_token_secret: self.refresh_secret.clone(),
            access_token_ttl: 3600,
            refresh_token_ttl: 7 * 24 * 3600,
            password_hash_cost: 1,
            rate_limit_per_minute: self.rate_limit_per_minute,
            login_rate_limit_per_minute: self.login_rate_limit_per_minute,
            trust_proxy_headers: false,
            admin_email: None,
            admin_password: None,
            admin_name: "Administrador".to_string(),
        }
    }

    pub fn to_state(&self) -> AppState {
        AppState::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: NEXT_TEST_USER_ID.fetch_add(1, Ordering::Relaxed),
            email: email.to_string(),
            name: "Usuario Teste".to_string(),
            role,
        }
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn cliente(email: &str) -> Self {
        Self::new(email, Role::Cliente)
    }

    pub fn mecanico(email: &str) -> Self {
        Self::new(email, Role::Mecanico)
    }

    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            name: self.name.clone(),
        }
    }

    pub fn to_user(&self, password_hash: &str) -> User {
        let now = Utc::now();
        User {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            password_hash: password_hash.to_string(),
            role: self.role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stores the user with the given password; the stored id replaces `self.id`.
    pub async fn persist(mut self, db: &Database, password: &str) -> Self {
        let hash = hash_password(password, 1).expect("test password hashes");
        let stored = db
            .users
            .insert(|id| {
                let mut user = self.to_user(&hash);
                user.id = id;
                user.email = user.email.to_lowercase();
                user
            })
            .await;
        self.id = stored.id;
        self
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(1));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "user_id": user.id,
            "email": user.email,
            "role": user.role.as_str(),
            "iat": now.timestamp(),
            "exp": exp.timestamp(),
            "jti": Uuid::new_v4().to_string()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(1))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Sends one request through `app` and returns the status with the JSON body
/// (`Value::Null` when empty).
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("test request builds");

    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("test body reads");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

/// Access token for `user`, signed by the state's token service.
pub fn access_token(state: &AppState, user: &TestUser) -> String {
    state
        .tokens
        .issue_access_token(&user.identity())
        .expect("test token issues")
}
