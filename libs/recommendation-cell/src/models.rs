use chrono::NaiveDate;
use serde::Deserialize;

use shared_models::workshop::Priority;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecommendationRequest {
    pub inspection_id: i64,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub due_mileage: Option<i64>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationFilter {
    pub vehicle_id: Option<i64>,
    pub resolved: Option<bool>,
    pub priority: Option<Priority>,
}
