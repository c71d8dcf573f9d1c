use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{FromRequest, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use shared_models::auth::{Role, TokenKind};
use shared_models::error::{AppError, AuthFailure};

use crate::jwt::IdentityClaim;
use crate::state::AppState;

pub type GateFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// Returns the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthFailure> {
    let auth_value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthFailure::MissingToken)?
        .to_str()
        .map_err(|_| AuthFailure::InvalidHeader)?;

    let parts: Vec<&str> = auth_value.split_whitespace().collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("Bearer") => Ok(*token),
        _ => Err(AuthFailure::InvalidHeader),
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<IdentityClaim, AuthFailure> {
    let token = bearer_token(headers)?;
    state
        .tokens
        .verify(token, TokenKind::Access)
        .map_err(AuthFailure::from)
}

// Requires a valid access token and attaches its claim to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claim = authenticate(&state, request.headers()).map_err(|failure| {
        warn!("Authentication failed for {}: {}", request.uri().path(), failure);
        AppError::Unauthorized(failure)
    })?;

    debug!("Authenticated user {} ({})", claim.user_id(), claim.role());
    request.extensions_mut().insert(claim);

    Ok(next.run(request).await)
}

// Attaches a claim when a valid token is present; otherwise continues anonymously.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(claim) => {
            request.extensions_mut().insert(claim);
        }
        Err(failure) => {
            debug!("Continuing anonymously: {}", failure);
        }
    }

    next.run(request).await
}

pub fn authorize_roles(claim: Option<&IdentityClaim>, allowed: &[Role]) -> Result<(), AppError> {
    let claim = claim.ok_or(AppError::Unauthorized(AuthFailure::NotAuthenticated))?;

    if allowed.contains(&claim.role()) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "Role {} is not allowed to perform this action",
            claim.role()
        )))
    }
}

/// Owner-or-Admin policy: ADMIN always passes, anyone else only for their own resource.
pub fn authorize_owner(claim: Option<&IdentityClaim>, owner_id: Option<i64>) -> Result<(), AppError> {
    let claim = claim.ok_or(AppError::Unauthorized(AuthFailure::NotAuthenticated))?;

    if claim.is_admin() || owner_id == Some(claim.user_id()) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You do not have access to this resource".to_string(),
        ))
    }
}

/// Read access for workshop records: any MECANICO, otherwise Owner-or-Admin.
pub fn authorize_mechanic_or_owner(
    claim: &IdentityClaim,
    owner_id: Option<i64>,
) -> Result<(), AppError> {
    if claim.has_role(Role::Mecanico) {
        return Ok(());
    }
    authorize_owner(Some(claim), owner_id)
}

/// Route layer admitting only the listed roles. Must run after `auth_middleware`.
pub fn require_roles(
    allowed: &'static [Role],
) -> impl Fn(Request, Next) -> GateFuture + Clone + Send + Sync + 'static {
    move |request: Request, next: Next| -> GateFuture {
        Box::pin(async move {
            authorize_roles(request.extensions().get::<IdentityClaim>(), allowed)?;
            Ok(next.run(request).await)
        })
    }
}

/// Route layer applying the Owner-or-Admin policy, with the owning user id
/// taken from the request by `owner_of`. Must run after `auth_middleware`.
pub fn require_owner_or_admin(
    owner_of: fn(&Request) -> Option<i64>,
) -> impl Fn(Request, Next) -> GateFuture + Clone + Send + Sync + 'static {
    move |request: Request, next: Next| -> GateFuture {
        Box::pin(async move {
            authorize_owner(request.extensions().get::<IdentityClaim>(), owner_of(&request))?;
            Ok(next.run(request).await)
        })
    }
}

/// Numeric id in the last path segment, e.g. `7` in `/users/7`.
pub fn last_path_id(request: &Request) -> Option<i64> {
    request
        .uri()
        .path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()?
        .parse()
        .ok()
}

/// The authenticated caller. Rejects with 401 when no claim is attached.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub IdentityClaim);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaim>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized(AuthFailure::NotAuthenticated))
    }
}

/// The caller's claim on optionally authenticated routes.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<IdentityClaim>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<IdentityClaim>().cloned()))
    }
}

/// `axum::Json` that rejects with an [`AppError`] body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Path` that rejects with an [`AppError`] body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// `axum::extract::Query` that rejects with an [`AppError`] body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);
