use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, TokenError, TokenKind, TokenPair, UserIdentity};
use shared_models::error::AppError;

/// Wire payload of both token kinds.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    user_id: i64,
    email: String,
    role: Role,
    iat: i64,
    exp: i64,
    jti: String,
}

/// The identity carried by a verified token.
///
/// Only [`TokenService::verify`] produces one, so holding an `IdentityClaim`
/// means its signature and expiry were checked.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityClaim {
    user_id: i64,
    email: String,
    role: Role,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl IdentityClaim {
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[derive(Clone)]
struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    configured: bool,
}

impl TokenKeys {
    fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
            configured: !secret.is_empty(),
        }
    }
}

/// Issues and verifies access and refresh tokens. Built once at startup;
/// each token kind has its own secret and lifetime.
#[derive(Clone)]
pub struct TokenService {
    access: TokenKeys,
    refresh: TokenKeys,
    validation: Validation,
}

impl TokenService {
    pub fn new(config: &AppConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            access: TokenKeys::new(&config.access_token_secret, config.access_token_ttl),
            refresh: TokenKeys::new(&config.refresh_token_secret, config.refresh_token_ttl),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &TokenKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access.ttl.num_seconds()
    }

    pub fn issue(&self, identity: &UserIdentity, kind: TokenKind) -> Result<String, AppError> {
        let keys = self.keys(kind);
        if !keys.configured {
            return Err(AppError::Internal(format!("{} token secret is not set", kind)));
        }

        let now = Utc::now();
        let claims = TokenClaims {
            user_id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: (now + keys.ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign {} token: {}", kind, e)))
    }

    pub fn issue_access_token(&self, identity: &UserIdentity) -> Result<String, AppError> {
        self.issue(identity, TokenKind::Access)
    }

    pub fn issue_refresh_token(&self, identity: &UserIdentity) -> Result<String, AppError> {
        self.issue(identity, TokenKind::Refresh)
    }

    pub fn issue_token_pair(&self, identity: &UserIdentity) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(identity)?,
            refresh_token: self.issue_refresh_token(identity)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl_secs(),
        })
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<IdentityClaim, TokenError> {
        let keys = self.keys(kind);
        if !keys.configured {
            debug!("{} token secret is not set", kind);
            return Err(TokenError::Invalid);
        }

        let data = decode::<TokenClaims>(token, &keys.decoding, &self.validation).map_err(|e| {
            debug!("{} token rejected: {}", kind, e);
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::InvalidSignature
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::Malformed,
                _ => TokenError::Invalid,
            }
        })?;

        let claims = data.claims;
        let issued_at = Utc.timestamp_opt(claims.iat, 0).single().ok_or(TokenError::Invalid)?;
        let expires_at = Utc.timestamp_opt(claims.exp, 0).single().ok_or(TokenError::Invalid)?;

        Ok(IdentityClaim {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    use crate::test_utils::{JwtTestUtils, TestConfig, TestUser};

    fn service() -> TokenService {
        TokenService::new(&TestConfig::default().to_app_config())
    }

    fn identity(role: Role) -> UserIdentity {
        UserIdentity {
            id: 17,
            email: "cliente@test.com".to_string(),
            role,
            name: "Cliente Teste".to_string(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = service();
        let token = tokens.issue_access_token(&identity(Role::Cliente)).unwrap();

        let claim = tokens.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claim.user_id(), 17);
        assert_eq!(claim.email(), "cliente@test.com");
        assert_eq!(claim.role(), Role::Cliente);
        assert_eq!(
            (claim.expires_at() - claim.issued_at()).num_seconds(),
            tokens.access_ttl_secs()
        );
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let tokens = service();
        let token = tokens.issue_refresh_token(&identity(Role::Mecanico)).unwrap();

        let claim = tokens.verify(&token, TokenKind::Refresh).unwrap();
        assert_eq!(claim.role(), Role::Mecanico);
        assert!(claim.expires_at() > Utc::now() + Duration::days(1));
    }

    #[test]
    fn test_token_kinds_do_not_cross_verify() {
        let tokens = service();
        let access = tokens.issue_access_token(&identity(Role::Admin)).unwrap();
        let refresh = tokens.issue_refresh_token(&identity(Role::Admin)).unwrap();

        assert_matches!(tokens.verify(&access, TokenKind::Refresh), Err(TokenError::Malformed));
        assert_matches!(tokens.verify(&refresh, TokenKind::Access), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tokens_for_same_identity_are_distinct() {
        let tokens = service();
        let first = tokens.issue_access_token(&identity(Role::Cliente)).unwrap();
        let second = tokens.issue_access_token(&identity(Role::Cliente)).unwrap();
        assert_ne!(first, second);

        let pair = tokens.issue_token_pair(&identity(Role::Cliente)).unwrap();
        assert_ne!(pair.access_token, pair.refresh_token);
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, tokens.access_ttl_secs());
    }

    #[test]
    fn test_expired_token_after_ttl() {
        let mut config = TestConfig::default().to_app_config();
        config.access_token_ttl = -30;
        let tokens = TokenService::new(&config);

        let token = tokens.issue_access_token(&identity(Role::Cliente)).unwrap();
        assert_matches!(tokens.verify(&token, TokenKind::Access), Err(TokenError::Expired));
    }

    #[test]
    fn test_hand_built_tokens() {
        let config = TestConfig::default();
        let tokens = TokenService::new(&config.to_app_config());
        let user = TestUser::cliente("cliente@test.com");

        let valid = JwtTestUtils::create_test_token(&user, &config.access_secret, Some(1));
        assert_eq!(tokens.verify(&valid, TokenKind::Access).unwrap().user_id(), user.id);

        let expired = JwtTestUtils::create_expired_token(&user, &config.access_secret);
        assert_matches!(tokens.verify(&expired, TokenKind::Access), Err(TokenError::Expired));

        let forged = JwtTestUtils::create_invalid_signature_token(&user);
        assert_matches!(tokens.verify(&forged, TokenKind::Access), Err(TokenError::Malformed));

        let garbage = JwtTestUtils::create_malformed_token();
        assert_matches!(tokens.verify(&garbage, TokenKind::Access), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let tokens = service();
        let token = tokens.issue_access_token(&identity(Role::Cliente)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let escalated = String::from_utf8(payload).unwrap().replace("CLIENTE", "ADMIN");
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(escalated),
            parts[2]
        );

        assert_matches!(tokens.verify(&forged, TokenKind::Access), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let tokens = service();
        let token = tokens.issue_access_token(&identity(Role::Cliente)).unwrap();
        let (head, signature) = token.rsplit_once('.').unwrap();
        let flipped: String = signature
            .chars()
            .rev()
            .collect();

        let result = tokens.verify(&format!("{}.{}", head, flipped), TokenKind::Access);
        assert_matches!(result, Err(TokenError::Malformed));
    }

    #[test]
    fn test_unconfigured_secret() {
        let mut config = TestConfig::default().to_app_config();
        config.access_token_secret.clear();
        let tokens = TokenService::new(&config);

        assert_matches!(
            tokens.issue_access_token(&identity(Role::Admin)),
            Err(AppError::Internal(_))
        );
        assert_matches!(tokens.verify("a.b.c", TokenKind::Access), Err(TokenError::Invalid));
    }
}
