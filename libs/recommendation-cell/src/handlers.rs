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

use crate::models::{CreateRecommendationRequest, RecommendationFilter};
use crate::services::RecommendationService;

pub async fn list_recommendations(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageQuery>,
    AppQuery(filter): AppQuery<RecommendationFilter>,
) -> Result<Json<Value>, AppError> {
    let recommendations = RecommendationService::new(&state)
        .list_recommendations(filter, &page)
        .await?;
    Ok(Json(json!(recommendations)))
}

pub async fn create_recommendation(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateRecommendationRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let recommendation = RecommendationService::new(&state)
        .create_recommendation(request)
        .await?;
    Ok((StatusCode::CREATED, Json(json!(recommendation))))
}

pub async fn get_recommendation(
    State(state): State<AppState>,
    CurrentUser(claim): CurrentUser,
    AppPath(recommendation_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let recommendation = RecommendationService::new(&state)
        .get_recommendation(recommendation_id, &claim)
        .await?;
    Ok(Json(json!(recommendation)))
}

pub async fn resolve_recommendation(
    State(state): State<AppState>,
    AppPath(recommendation_id): AppPath<i64>,
) -> Result<Json<Value>, AppError> {
    let recommendation = RecommendationService::new(&state)
        .resolve_recommendation(recommendation_id)
        .await?;
    Ok(Json(json!(recommendation)))
}

pub async fn delete_recommendation(
    State(state): State<AppState>,
    AppPath(recommendation_id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    RecommendationService::new(&state)
        .delete_recommendation(recommendation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
