use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_models::auth::TokenKind;
use shared_models::error::{AppError, AuthFailure};
use shared_models::pagination::PageQuery;
use shared_utils::extractor::{AppJson, AppPath, AppQuery, CurrentUser};
use shared_utils::AppState;

use crate::models::{
    AuthResponse, CreateUserRequest, LoginRequest, RefreshRequest, RegisterRequest,
    UpdateUserRequest, UserFilter,
};
use crate::services::{CredentialVerifier, UserService};

pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = UserService::new(&state).register(request).await?;
    let tokens = state.tokens.issue_token_pair(&user.identity())?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": user,
            "tokens": tokens
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let verifier = CredentialVerifier::new(state.db.clone(), state.dummy_password_hash.clone());
    let identity = verifier.verify(&request.email, &request.password).await?;

    let user = UserService::new(&state).get_user(identity.id).await?;
    let tokens = state.tokens.issue_token_pair(&identity)?;

    Ok(Json(AuthResponse { user, tokens }))
}

pub async fn refresh(
    State(state): State<AppState>,
    AppJson(request): AppJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let claim = state
        .tokens
        .verify(&request.refresh_token, TokenKind::Refresh)?;

    // Role and email come from the current record, not the old token.
    let user = state.db.users.get(claim.user_id()).await.ok_or_else(|| {
        warn!("Refresh token presented for deleted user {}", claim.user_id());
        AppError::Unauthorized(AuthFailure::TokenInvalid)
    })?;

    let tokens = state.tokens.issue_token_pair(&user.identity())?;
    debug!("Refreshed tokens for user {}", user.id);

    Ok(Json(AuthResponse { user, tokens }))
}

pub async fn logout(CurrentUser(claim): CurrentUser) -> Json<Value> {
    info!("User {} logged out", claim.user_id());
    Json(json!({ "message": "Logged out successfully" }))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
) -> Result<Json<Value>, AppError> {
    let user = UserService::new(&state).get_user(claim.user_id()).await?;

    Ok(Json(json!({
        "user": user,
        "token_issued_at": claim.issued_at(),
        "token_expires_at": claim.expires_at()
    })))
}

pub async fn list_users(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<UserFilter>,
) -> Result<Json<Value>, AppError> {
    let users = UserService::new(&state).list_users(filter, &page).await?;
    Ok(Json(json!(users)))
}

pub async fn create_user(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = UserService::new(&state).create_user(request).await?;
    Ok((StatusCode::CREATED, Json(json!(user))))
}

pub async fn get_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let user = UserService::new(&state).get_user(user_id).await?;
    Ok(Json(json!(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(user_id): AppPath<i64>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let user = UserService::new(&state)
        .update_user(user_id, request, &claim)
        .await?;
    Ok(Json(json!(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(user_id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    UserService::new(&state).delete_user(user_id, &claim).await?;
    Ok(StatusCode::NO_CONTENT)
}
