use serde::{Deserialize, Serialize};

use shared_models::workshop::{Inspection, Recommendation, Vehicle};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVehicleRequest {
    pub client_id: i64,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    #[serde(default)]
    pub mileage: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVehicleRequest {
    pub plate: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub mileage: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilter {
    pub client_id: Option<i64>,
    pub plate: Option<String>,
}

/// A vehicle with its full service record.
#[derive(Debug, Clone, Serialize)]
pub struct VehicleHistory {
    pub vehicle: Vehicle,
    pub inspections: Vec<Inspection>,
    pub recommendations: Vec<Recommendation>,
}
