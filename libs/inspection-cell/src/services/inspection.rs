use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use shared_database::Database;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_models::pagination::{PageQuery, Paginated};
use shared_models::workshop::{Inspection, InspectionStatus, Mechanic};
use shared_utils::extractor::{authorize_mechanic_or_owner, authorize_owner};
use shared_utils::jwt::IdentityClaim;
use shared_utils::AppState;

use crate::models::{
    AssignMechanicRequest, CreateInspectionRequest, InspectionFilter, UpdateStatusRequest,
};

fn not_found(inspection_id: i64) -> AppError {
    AppError::NotFound(format!("Inspection {} not found", inspection_id))
}

pub struct InspectionService {
    db: Arc<Database>,
}

impl InspectionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }

    async fn active_mechanic(&self, mechanic_id: i64) -> Result<Mechanic, AppError> {
        let mechanic = self
            .db
            .mechanics
            .get(mechanic_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Mechanic {} not found", mechanic_id)))?;

        if !mechanic.active {
            return Err(AppError::ValidationError(format!(
                "Mechanic {} is inactive",
                mechanic_id
            )));
        }
        Ok(mechanic)
    }

    async fn load(&self, inspection_id: i64) -> Result<Inspection, AppError> {
        self.db
            .inspections
            .get(inspection_id)
            .await
            .ok_or_else(|| not_found(inspection_id))
    }

    pub async fn list_inspections(
        &self,
        filter: InspectionFilter,
        page: &PageQuery,
    ) -> Result<Paginated<Inspection>, AppError> {
        let mut inspections = self
            .db
            .inspections
            .filter(|i| {
                filter.status.map_or(true, |s| i.status == s)
                    && filter.vehicle_id.map_or(true, |v| i.vehicle_id == v)
                    && filter.mechanic_id.map_or(true, |m| i.mechanic_id == Some(m))
            })
            .await;
        inspections.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));

        Ok(Paginated::from_items(inspections, page))
    }

    pub async fn schedule_inspection(
        &self,
        request: CreateInspectionRequest,
        caller: &IdentityClaim,
    ) -> Result<Inspection, AppError> {
        debug!("Scheduling inspection for vehicle {}", request.vehicle_id);

        let _relations = self.db.lock_relations().await;
        if !self.db.vehicles.exists(|v| v.id == request.vehicle_id).await {
            return Err(AppError::NotFound(format!(
                "Vehicle {} not found",
                request.vehicle_id
            )));
        }

        if caller.has_role(Role::Cliente) {
            authorize_owner(Some(caller), self.db.vehicle_owner(request.vehicle_id).await)?;
            if request.mechanic_id.is_some() {
                return Err(AppError::Forbidden(
                    "Only administrators assign mechanics".to_string(),
                ));
            }
        }

        let mechanic_id = match request.mechanic_id {
            Some(id) => Some(self.active_mechanic(id).await?.id),
            None => None,
        };
        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let inspection = self
            .db
            .inspections
            .insert(|id| {
                let now = Utc::now();
                Inspection {
                    id,
                    vehicle_id: request.vehicle_id,
                    mechanic_id,
                    status: InspectionStatus::Agendada,
                    scheduled_at: request.scheduled_at,
                    description,
                    mileage: None,
                    total_cost: None,
                    notes: None,
                    completed_at: None,
                    created_at: now,
                    updated_at: now,
                }
            })
            .await;

        info!(
            "Scheduled inspection {} for vehicle {} at {}",
            inspection.id, inspection.vehicle_id, inspection.scheduled_at
        );
        Ok(inspection)
    }

    pub async fn get_inspection(
        &self,
        inspection_id: i64,
        caller: &IdentityClaim,
    ) -> Result<Inspection, AppError> {
        let inspection = self.load(inspection_id).await?;
        authorize_mechanic_or_owner(caller, self.db.inspection_owner(inspection_id).await)?;
        Ok(inspection)
    }

    pub async fn assign_mechanic(
        &self,
        inspection_id: i64,
        request: AssignMechanicRequest,
    ) -> Result<Inspection, AppError> {
        let _relations = self.db.lock_relations().await;
        let mechanic = self.active_mechanic(request.mechanic_id).await?;

        let inspection = self
            .db
            .inspections
            .update(inspection_id, |inspection, _| {
                if inspection.status.is_terminal() {
                    return Err(AppError::Conflict(format!(
                        "Inspection is {} and can no longer be reassigned",
                        inspection.status
                    )));
                }
                inspection.mechanic_id = Some(mechanic.id);
                inspection.updated_at = Utc::now();
                Ok(())
            })
            .await?
            .ok_or_else(|| not_found(inspection_id))?;

        info!("Assigned mechanic {} to inspection {}", mechanic.id, inspection_id);
        Ok(inspection)
    }

    /// Moves an inspection through its lifecycle. Mechanics may only move the
    /// inspections assigned to them.
    pub async fn update_status(
        &self,
        inspection_id: i64,
        request: UpdateStatusRequest,
        caller: &IdentityClaim,
    ) -> Result<Inspection, AppError> {
        let _relations = self.db.lock_relations().await;
        let current = self.load(inspection_id).await?;

        if caller.has_role(Role::Mecanico) {
            let own = self.db.mechanic_for_user(caller.user_id()).await.map(|m| m.id);
            if own.is_none() || own != current.mechanic_id {
                warn!(
                    "User {} tried to update inspection {} assigned to someone else",
                    caller.user_id(),
                    inspection_id
                );
                return Err(AppError::Forbidden(
                    "This inspection is not assigned to you".to_string(),
                ));
            }
        }

        if request.total_cost.is_some_and(|c| !c.is_finite() || c < 0.0) {
            return Err(AppError::ValidationError(
                "Total cost must be a non-negative amount".to_string(),
            ));
        }

        let completing = request.status == InspectionStatus::Concluida;
        let reading = match request.mileage {
            Some(mileage) if completing => {
                let vehicle = self
                    .db
                    .vehicles
                    .get(current.vehicle_id)
                    .await
                    .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", current.vehicle_id)))?;
                if mileage < vehicle.mileage {
                    return Err(AppError::ValidationError(format!(
                        "Mileage reading is below the vehicle's current {} km",
                        vehicle.mileage
                    )));
                }
                Some(mileage)
            }
            Some(_) => {
                return Err(AppError::ValidationError(
                    "Mileage is recorded only when completing an inspection".to_string(),
                ))
            }
            None => None,
        };

        let inspection = self
            .db
            .inspections
            .update(inspection_id, |inspection, _| {
                if !inspection.status.can_transition_to(request.status) {
                    return Err(AppError::Conflict(format!(
                        "Cannot move inspection from {} to {}",
                        inspection.status, request.status
                    )));
                }
                if request.status == InspectionStatus::EmAndamento && inspection.mechanic_id.is_none() {
                    return Err(AppError::Conflict(
                        "Assign a mechanic before starting the inspection".to_string(),
                    ));
                }

                let now = Utc::now();
                inspection.status = request.status;
                if completing {
                    inspection.completed_at = Some(now);
                    inspection.mileage = reading;
                }
                if request.total_cost.is_some() {
                    inspection.total_cost = request.total_cost;
                }
                if let Some(notes) = request.notes {
                    inspection.notes = Some(notes);
                }
                inspection.updated_at = now;
                Ok(())
            })
            .await?
            .ok_or_else(|| not_found(inspection_id))?;

        if let Some(mileage) = reading {
            self.db
                .vehicles
                .update(inspection.vehicle_id, |vehicle, _| {
                    vehicle.mileage = vehicle.mileage.max(mileage);
                    vehicle.updated_at = Utc::now();
                    Ok::<_, AppError>(())
                })
                .await?;
        }

        info!("Inspection {} is now {}", inspection_id, inspection.status);
        Ok(inspection)
    }

    /// Removes the inspection together with its recommendations.
    pub async fn delete_inspection(&self, inspection_id: i64) -> Result<(), AppError> {
        let _relations = self.db.lock_relations().await;
        self.db
            .inspections
            .remove(inspection_id)
            .await
            .ok_or_else(|| not_found(inspection_id))?;

        let removed = self
            .db
            .recommendations
            .remove_where(|r| r.inspection_id == inspection_id)
            .await;

        info!(
            "Deleted inspection {} and {} recommendation(s)",
            inspection_id, removed
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;
    use shared_models::auth::TokenKind;
    use shared_models::workshop::{Client, Vehicle};
    use shared_utils::test_utils::{TestConfig, TestUser};

    fn claim(state: &AppState, user: &TestUser) -> IdentityClaim {
        let token = state.tokens.issue_access_token(&user.identity()).unwrap();
        state.tokens.verify(&token, TokenKind::Access).unwrap()
    }

    async fn seed_vehicle(state: &AppState, owner: Option<i64>) -> Vehicle {
        let now = Utc::now();
        let client = state
            .db
            .clients
            .insert(|id| Client {
                id,
                user_id: owner,
                name: "Maria Souza".to_string(),
                cpf: "52998224725".to_string(),
                email: None,
                phone: "11987654321".to_string(),
                cep: None,
                address: None,
                created_at: now,
                updated_at: now,
            })
            .await;
        state
            .db
            .vehicles
            .insert(|id| Vehicle {
                id,
                client_id: client.id,
                plate: format!("ABC123{}", id),
                brand: "Fiat".to_string(),
                model: "Argo".to_string(),
                year: 2020,
                color: None,
                mileage: 40_000,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    async fn seed_mechanic(state: &AppState, user_id: Option<i64>, active: bool) -> Mechanic {
        let now = Utc::now();
        state
            .db
            .mechanics
            .insert(|id| Mechanic {
                id,
                user_id,
                name: "Carlos".to_string(),
                specialty: None,
                phone: None,
                email: None,
                active,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    fn schedule(vehicle_id: i64) -> CreateInspectionRequest {
        CreateInspectionRequest {
            vehicle_id,
            scheduled_at: Utc::now() + Duration::days(2),
            description: Some("Revisão dos 40 mil".to_string()),
            mechanic_id: None,
        }
    }

    fn status(status: InspectionStatus) -> UpdateStatusRequest {
        UpdateStatusRequest {
            status,
            mileage: None,
            total_cost: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_cliente_schedules_only_for_own_vehicle() {
        let state = TestConfig::default().to_state();
        let service = InspectionService::new(&state);
        let owner = TestUser::cliente("dono@test.com");
        let own = seed_vehicle(&state, Some(owner.id)).await;
        let foreign = seed_vehicle(&state, None).await;
        let caller = claim(&state, &owner);

        let inspection = service.schedule_inspection(schedule(own.id), &caller).await.unwrap();
        assert_eq!(inspection.status, InspectionStatus::Agendada);

        assert_matches!(
            service.schedule_inspection(schedule(foreign.id), &caller).await,
            Err(AppError::Forbidden(_))
        );

        let mut with_mechanic = schedule(own.id);
        with_mechanic.mechanic_id = Some(1);
        assert_matches!(
            service.schedule_inspection(with_mechanic, &caller).await,
            Err(AppError::Forbidden(_))
        );
    }

    #[tokio::test]
    async fn test_full_lifecycle_raises_vehicle_mileage() {
        let state = TestConfig::default().to_state();
        let service = InspectionService::new(&state);
        let admin = claim(&state, &TestUser::admin("admin@test.com"));
        let vehicle = seed_vehicle(&state, None).await;
        let mechanic_user = TestUser::mecanico("carlos@test.com");
        let mechanic = seed_mechanic(&state, Some(mechanic_user.id), true).await;
        let mecanico = claim(&state, &mechanic_user);

        let inspection = service.schedule_inspection(schedule(vehicle.id), &admin).await.unwrap();

        // Starting needs an assigned mechanic.
        assert_matches!(
            service
                .update_status(inspection.id, status(InspectionStatus::EmAndamento), &admin)
                .await,
            Err(AppError::Conflict(_))
        );

        service
            .assign_mechanic(inspection.id, AssignMechanicRequest { mechanic_id: mechanic.id })
            .await
            .unwrap();
        service
            .update_status(inspection.id, status(InspectionStatus::EmAndamento), &mecanico)
            .await
            .unwrap();

        let mut done = status(InspectionStatus::Concluida);
        done.mileage = Some(41_250);
        done.total_cost = Some(850.0);
        let completed = service.update_status(inspection.id, done, &mecanico).await.unwrap();

        assert_eq!(completed.status, InspectionStatus::Concluida);
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.mileage, Some(41_250));
        assert_eq!(state.db.vehicles.get(vehicle.id).await.unwrap().mileage, 41_250);

        assert_matches!(
            service
                .update_status(inspection.id, status(InspectionStatus::Cancelada), &admin)
                .await,
            Err(AppError::Conflict(_))
        );
        assert_matches!(
            service
                .assign_mechanic(inspection.id, AssignMechanicRequest { mechanic_id: mechanic.id })
                .await,
            Err(AppError::Conflict(_))
        );
    }

    #[tokio::test]
    async fn test_only_assigned_mechanic_moves_status() {
        let state = TestConfig::default().to_state();
        let service = InspectionService::new(&state);
        let admin = claim(&state, &TestUser::admin("admin@test.com"));
        let vehicle = seed_vehicle(&state, None).await;
        let assigned = seed_mechanic(&state, Some(500), true).await;
        let other_user = TestUser::mecanico("outro@test.com");
        seed_mechanic(&state, Some(other_user.id), true).await;

        let mut request = schedule(vehicle.id);
        request.mechanic_id = Some(assigned.id);
        let inspection = service.schedule_inspection(request, &admin).await.unwrap();

        assert_matches!(
            service
                .update_status(
                    inspection.id,
                    status(InspectionStatus::EmAndamento),
                    &claim(&state, &other_user)
                )
                .await,
            Err(AppError::Forbidden(_))
        );
        // A mecanico without a mechanic record is never assigned.
        assert_matches!(
            service
                .update_status(
                    inspection.id,
                    status(InspectionStatus::EmAndamento),
                    &claim(&state, &TestUser::mecanico("novo@test.com"))
                )
                .await,
            Err(AppError::Forbidden(_))
        );
    }

    #[tokio::test]
    async fn test_inactive_mechanic_and_bad_readings() {
        let state = TestConfig::default().to_state();
        let service = InspectionService::new(&state);
        let admin = claim(&state, &TestUser::admin("admin@test.com"));
        let vehicle = seed_vehicle(&state, None).await;
        let retired = seed_mechanic(&state, None, false).await;
        let active = seed_mechanic(&state, None, true).await;

        let inspection = service.schedule_inspection(schedule(vehicle.id), &admin).await.unwrap();
        assert_matches!(
            service
                .assign_mechanic(inspection.id, AssignMechanicRequest { mechanic_id: retired.id })
                .await,
            Err(AppError::ValidationError(_))
        );

        service
            .assign_mechanic(inspection.id, AssignMechanicRequest { mechanic_id: active.id })
            .await
            .unwrap();
        service
            .update_status(inspection.id, status(InspectionStatus::EmAndamento), &admin)
            .await
            .unwrap();

        let mut rollback = status(InspectionStatus::Concluida);
        rollback.mileage = Some(39_000);
        assert_matches!(
            service.update_status(inspection.id, rollback, &admin).await,
            Err(AppError::ValidationError(_))
        );

        let mut negative = status(InspectionStatus::Concluida);
        negative.total_cost = Some(-10.0);
        assert_matches!(
            service.update_status(inspection.id, negative, &admin).await,
            Err(AppError::ValidationError(_))
        );

        assert_eq!(
            service.load(inspection.id).await.unwrap().status,
            InspectionStatus::EmAndamento
        );
    }

    #[tokio::test]
    async fn test_delete_cascades_recommendations() {
        use shared_models::workshop::{Priority, Recommendation};

        let state = TestConfig::default().to_state();
        let service = InspectionService::new(&state);
        let admin = claim(&state, &TestUser::admin("admin@test.com"));
        let vehicle = seed_vehicle(&state, None).await;
        let inspection = service.schedule_inspection(schedule(vehicle.id), &admin).await.unwrap();

        let now = Utc::now();
        state
            .db
            .recommendations
            .insert(|id| Recommendation {
                id,
                inspection_id: inspection.id,
                vehicle_id: vehicle.id,
                description: "Trocar pastilhas".to_string(),
                priority: Priority::Alta,
                due_mileage: None,
                due_date: None,
                resolved: false,
                created_at: now,
                updated_at: now,
            })
            .await;

        service.delete_inspection(inspection.id).await.unwrap();
        assert!(state.db.recommendations.is_empty().await);
        assert_matches!(service.delete_inspection(inspection.id).await, Err(AppError::NotFound(_)));
    }
}
