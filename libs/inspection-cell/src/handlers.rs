use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;
use shared_models::pagination::PageQuery;
use shared_utils::extractor::{AppJson, AppPath, AppQuery, CurrentUser};
use shared_utils::AppState;

use crate::models::{
    AssignMechanicRequest, CreateInspectionRequest, InspectionFilter, UpdateStatusRequest,
};
use crate::services::InspectionService;

pub async fn list_inspections(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<InspectionFilter>,
) -> Result<Json<Value>, AppError> {
    let inspections = InspectionService::new(&state)
        .list_inspections(filter, &page)
        .await?;
    Ok(Json(json!(inspections)))
}

pub async fn schedule_inspection(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppJson(request): AppJson<CreateInspectionRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let inspection = InspectionService::new(&state)
        .schedule_inspection(request, &claim)
        .await?;
    Ok((StatusCode::CREATED, Json(json!(inspection))))
}

pub async fn get_inspection(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(inspection_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let inspection = InspectionService::new(&state)
        .get_inspection(inspection_id, &claim)
        .await?;
    Ok(Json(json!(inspection)))
}

pub async fn assign_mechanic(
    State(state): State<AppState>,
    AppPath(inspection_id): AppPath<i64>,
    AppJson(request): AppJson<AssignMechanicRequest>,
) -> Result<Json<Value>, AppError> {
    let inspection = InspectionService::new(&state)
        .assign_mechanic(inspection_id, request)
        .await?;
    Ok(Json(json!(inspection)))
}

pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(inspection_id): AppPath<i64>,
    AppJson(request): AppJson<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let inspection = InspectionService::new(&state)
        .update_status(inspection_id, request, &claim)
        .await?;
    Ok(Json(json!(inspection)))
}

pub async fn delete_inspection(
    State(state): State<AppState>,
    AppPath(inspection_id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    InspectionService::new(&state)
        .delete_inspection(inspection_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
