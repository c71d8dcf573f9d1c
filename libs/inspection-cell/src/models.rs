use chrono::{DateTime, Utc};
use serde::Deserialize;

use shared_models::workshop::InspectionStatus;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInspectionRequest {
    pub vehicle_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub description: Option<String>,
    /// Administrators may assign a mechanic up front.
    pub mechanic_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignMechanicRequest {
    pub mechanic_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: InspectionStatus,
    /// Odometer reading at completion.
    pub mileage: Option<i64>,
    pub total_cost: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InspectionFilter {
    pub status: Option<InspectionStatus>,
    pub vehicle_id: Option<i64>,
    pub mechanic_id: Option<i64>,
}
