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

use crate::models::{CreateVehicleRequest, UpdateVehicleRequest, VehicleFilter};
use crate::services::VehicleService;

pub async fn list_vehicles(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<VehicleFilter>,
) -> Result<Json<Value>, AppError> {
    let vehicles = VehicleService::new(&state).list_vehicles(filter, &page).await?;
    Ok(Json(json!(vehicles)))
}

pub async fn create_vehicle(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppJson(request): AppJson<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let vehicle = VehicleService::new(&state)
        .create_vehicle(request, &claim)
        .await?;
    Ok((StatusCode::CREATED, Json(json!(vehicle))))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(vehicle_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let vehicle = VehicleService::new(&state).get_vehicle(vehicle_id, &claim).await?;
    Ok(Json(json!(vehicle)))
}

pub async fn update_vehicle(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(vehicle_id): AppPath<i64>,
    AppJson(request): AppJson<UpdateVehicleRequest>,
) -> Result<Json<Value>, AppError> {
    let vehicle = VehicleService::new(&state)
        .update_vehicle(vehicle_id, request, &claim)
        .await?;
    Ok(Json(json!(vehicle)))
}

pub async fn delete_vehicle(
    State(state): State<AppState>,
    AppPath(vehicle_id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    VehicleService::new(&state).delete_vehicle(vehicle_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vehicle_history(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(vehicle_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let history = VehicleService::new(&state)
        .vehicle_history(vehicle_id, &claim)
        .await?;
    Ok(Json(json!(history)))
}
