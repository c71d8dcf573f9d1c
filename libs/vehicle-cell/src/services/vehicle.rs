use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::{debug, info};

use shared_database::Database;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_models::pagination::{PageQuery, Paginated};
use shared_models::workshop::Vehicle;
use shared_utils::extractor::{authorize_mechanic_or_owner, authorize_owner};
use shared_utils::jwt::IdentityClaim;
use shared_utils::validators::{normalize_plate, required};
use shared_utils::AppState;

use crate::models::{CreateVehicleRequest, UpdateVehicleRequest, VehicleFilter, VehicleHistory};

const FIRST_MODEL_YEAR: i32 = 1900;

fn validate_year(year: i32) -> Result<i32, AppError> {
    let newest = Utc::now().year() + 1;
    if (FIRST_MODEL_YEAR..=newest).contains(&year) {
        Ok(year)
    } else {
        Err(AppError::ValidationError(format!(
            "Year must be between {} and {}",
            FIRST_MODEL_YEAR, newest
        )))
    }
}

fn validate_mileage(mileage: i64) -> Result<i64, AppError> {
    if mileage < 0 {
        Err(AppError::ValidationError("Mileage cannot be negative".to_string()))
    } else {
        Ok(mileage)
    }
}

fn plate_taken(plate: &str) -> AppError {
    AppError::Conflict(format!("A vehicle with plate {} already exists", plate))
}

fn not_found(vehicle_id: i64) -> AppError {
    AppError::NotFound(format!("Vehicle {} not found", vehicle_id))
}

pub struct VehicleService {
    db: Arc<Database>,
}

impl VehicleService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }

    pub async fn list_vehicles(
        &self,
        filter: VehicleFilter,
        page: &PageQuery,
    ) -> Result<Paginated<Vehicle>, AppError> {
        let plate = filter
            .plate
            .map(|p| p.trim().replace('-', "").to_uppercase())
            .filter(|p| !p.is_empty());

        let vehicles = self
            .db
            .vehicles
            .filter(|v| {
                filter.client_id.map_or(true, |id| v.client_id == id)
                    && plate.as_ref().map_or(true, |p| v.plate.contains(p.as_str()))
            })
            .await;

        Ok(Paginated::from_items(vehicles, page))
    }

    pub async fn create_vehicle(
        &self,
        request: CreateVehicleRequest,
        caller: &IdentityClaim,
    ) -> Result<Vehicle, AppError> {
        debug!("Creating vehicle for client {}", request.client_id);

        let _relations = self.db.lock_relations().await;
        let client = self
            .db
            .clients
            .get(request.client_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", request.client_id)))?;
        if caller.has_role(Role::Cliente) {
            authorize_owner(Some(caller), client.user_id)?;
        }

        let plate = normalize_plate(&request.plate)?;
        let brand = required("brand", &request.brand)?;
        let model = required("model", &request.model)?;
        let year = validate_year(request.year)?;
        let mileage = validate_mileage(request.mileage)?;
        let color = request
            .color
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let vehicle = self
            .db
            .vehicles
            .try_insert(|id, rows| {
                if rows.values().any(|v| v.plate == plate) {
                    return Err(plate_taken(&plate));
                }
                let now = Utc::now();
                Ok(Vehicle {
                    id,
                    client_id: client.id,
                    plate: plate.clone(),
                    brand,
                    model,
                    year,
                    color,
                    mileage,
                    created_at: now,
                    updated_at: now,
                })
            })
            .await?;

        info!("Created vehicle {} ({})", vehicle.id, vehicle.plate);
        Ok(vehicle)
    }

    async fn load(&self, vehicle_id: i64) -> Result<(Vehicle, Option<i64>), AppError> {
        let vehicle = self.db.vehicles.get(vehicle_id).await.ok_or_else(|| not_found(vehicle_id))?;
        let owner = self.db.client_owner(vehicle.client_id).await;
        Ok((vehicle, owner))
    }

    pub async fn get_vehicle(&self, vehicle_id: i64, caller: &IdentityClaim) -> Result<Vehicle, AppError> {
        let (vehicle, owner) = self.load(vehicle_id).await?;
        authorize_mechanic_or_owner(caller, owner)?;
        Ok(vehicle)
    }

    pub async fn update_vehicle(
        &self,
        vehicle_id: i64,
        request: UpdateVehicleRequest,
        caller: &IdentityClaim,
    ) -> Result<Vehicle, AppError> {
        let (_, owner) = self.load(vehicle_id).await?;
        authorize_owner(Some(caller), owner)?;

        let plate = request.plate.as_deref().map(normalize_plate).transpose()?;
        let brand = request.brand.as_deref().map(|b| required("brand", b)).transpose()?;
        let model = request.model.as_deref().map(|m| required("model", m)).transpose()?;
        let year = request.year.map(validate_year).transpose()?;
        let mileage = request.mileage.map(validate_mileage).transpose()?;

        let updated = self
            .db
            .vehicles
            .update(vehicle_id, |vehicle, rows| {
                if let Some(mileage) = mileage {
                    if mileage < vehicle.mileage {
                        return Err(AppError::ValidationError(format!(
                            "Mileage cannot decrease (current {} km)",
                            vehicle.mileage
                        )));
                    }
                    vehicle.mileage = mileage;
                }
                if let Some(plate) = plate {
                    if rows.values().any(|v| v.id != vehicle_id && v.plate == plate) {
                        return Err(plate_taken(&plate));
                    }
                    vehicle.plate = plate;
                }
                if let Some(brand) = brand {
                    vehicle.brand = brand;
                }
                if let Some(model) = model {
                    vehicle.model = model;
                }
                if let Some(year) = year {
                    vehicle.year = year;
                }
                if let Some(color) = request.color {
                    vehicle.color = Some(color.trim().to_string()).filter(|c| !c.is_empty());
                }
                vehicle.updated_at = Utc::now();
                Ok(())
            })
            .await?
            .ok_or_else(|| not_found(vehicle_id))?;

        info!("Updated vehicle {}", vehicle_id);
        Ok(updated)
    }

    pub async fn delete_vehicle(&self, vehicle_id: i64) -> Result<(), AppError> {
        let _relations = self.db.lock_relations().await;
        if self.db.inspections.exists(|i| i.vehicle_id == vehicle_id).await {
            return Err(AppError::Conflict(
                "Vehicle has inspections and cannot be deleted".to_string(),
            ));
        }

        self.db
            .vehicles
            .remove(vehicle_id)
            .await
            .ok_or_else(|| not_found(vehicle_id))?;

        info!("Deleted vehicle {}", vehicle_id);
        Ok(())
    }

    /// Inspections newest first, then recommendations with open ones first.
    pub async fn vehicle_history(
        &self,
        vehicle_id: i64,
        caller: &IdentityClaim,
    ) -> Result<VehicleHistory, AppError> {
        let vehicle = self.get_vehicle(vehicle_id, caller).await?;

        let mut inspections = self.db.inspections.filter(|i| i.vehicle_id == vehicle_id).await;
        inspections.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));

        let mut recommendations = self
            .db
            .recommendations
            .filter(|r| r.vehicle_id == vehicle_id)
            .await;
        recommendations.sort_by_key(|r| (r.resolved, r.id));

        Ok(VehicleHistory {
            vehicle,
            inspections,
            recommendations,
        })
    }
}
