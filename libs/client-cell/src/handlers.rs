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

use crate::models::{ClientSearchQuery, CreateClientRequest, UpdateClientRequest};
use crate::services::ClientService;

pub async fn list_clients(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(query): AppQuery<ClientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let clients = ClientService::new(&state).list_clients(query, &page).await?;
    Ok(Json(json!(clients)))
}

pub async fn create_client(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppJson(request): AppJson<CreateClientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let client = ClientService::new(&state)
        .create_client(request, &claim)
        .await?;
    Ok((StatusCode::CREATED, Json(json!(client))))
}

pub async fn get_my_client(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
) -> Result<Json<Value>, AppError> {
    let client = ClientService::new(&state).get_own_client(&claim).await?;
    Ok(Json(json!(client)))
}

pub async fn get_client(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(client_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let client = ClientService::new(&state).get_client(client_id, &claim).await?;
    Ok(Json(json!(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(client_id): AppPath<i64>,
    AppJson(request): AppJson<UpdateClientRequest>,
) -> Result<Json<Value>, AppError> {
    let client = ClientService::new(&state)
        .update_client(client_id, request, &claim)
        .await?;
    Ok(Json(json!(client)))
}

pub async fn delete_client(
    State(state): State<AppState>,
    AppPath(client_id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    ClientService::new(&state).delete_client(client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_client_vehicles(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(client_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let vehicles = ClientService::new(&state)
        .list_client_vehicles(client_id, &claim)
        .await?;
    Ok(Json(json!({
        "client_id": client_id,
        "vehicles": vehicles,
        "total": vehicles.len()
    })))
}
