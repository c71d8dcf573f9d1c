use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_models::pagination::PageQuery;
use shared_utils::extractor::{AppJson, AppPath, AppQuery, CurrentUser, MaybeUser};
use shared_utils::AppState;

use crate::models::{CreateMechanicRequest, MechanicQuery, UpdateMechanicRequest};
use crate::services::MechanicService;

pub async fn list_mechanics(
    State(state): State<AppState>,
    MaybeUser(claim): MaybeUser,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(query): AppQuery<MechanicQuery>,
) -> Result<Json<Value>, AppError> {
    let mechanics = MechanicService::new(&state)
        .list_mechanics(query, &page, claim.as_ref())
        .await?;
    Ok(Json(json!(mechanics)))
}

pub async fn get_mechanic(
    State(state): State<AppState>,
    MaybeUser(claim): MaybeUser,
    AppPath(mechanic_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let mechanic = MechanicService::new(&state)
        .get_mechanic(mechanic_id, claim.as_ref())
        .await?;
    Ok(Json(json!(mechanic)))
}

pub async fn create_mechanic(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateMechanicRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let mechanic = MechanicService::new(&state).create_mechanic(request).await?;
    Ok((StatusCode::CREATED, Json(json!(mechanic))))
}

pub async fn update_mechanic(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(mechanic_id): AppPath<i64>,
    AppJson(request): AppJson<UpdateMechanicRequest>,
) -> Result<Json<Value>, AppError> {
    let mechanic = MechanicService::new(&state)
        .update_mechanic(mechanic_id, request, &claim)
        .await?;
    Ok(Json(json!(mechanic)))
}

pub async fn deactivate_mechanic(
    State(state): State<AppState>,
    AppPath(mechanic_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let mechanic = MechanicService::new(&state)
        .deactivate_mechanic(mechanic_id)
        .await?;
    Ok(Json(json!({
        "message": "Mechanic deactivated",
        "mechanic": mechanic
    })))
}
