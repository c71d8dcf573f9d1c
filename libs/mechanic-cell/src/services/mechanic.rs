use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shared_database::Database;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_models::pagination::{PageQuery, Paginated};
use shared_models::workshop::Mechanic;
use shared_utils::extractor::authorize_owner;
use shared_utils::jwt::IdentityClaim;
use shared_utils::validators::{normalize_email, normalize_phone, required};
use shared_utils::AppState;

use crate::models::{
    CreateMechanicRequest, MechanicQuery, MechanicView, PublicMechanic, UpdateMechanicRequest,
};

fn optional<F>(value: Option<&str>, normalize: F) -> Result<Option<String>, AppError>
where
    F: Fn(&str) -> Result<String, AppError>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => normalize(v).map(Some),
        None => Ok(None),
    }
}

fn not_found(mechanic_id: i64) -> AppError {
    AppError::NotFound(format!("Mechanic {} not found", mechanic_id))
}

fn is_admin(caller: Option<&IdentityClaim>) -> bool {
    caller.is_some_and(IdentityClaim::is_admin)
}

fn view(mechanic: Mechanic, admin: bool) -> MechanicView {
    if admin {
        MechanicView::Full(mechanic)
    } else {
        MechanicView::Public(PublicMechanic::from(mechanic))
    }
}

pub struct MechanicService {
    db: Arc<Database>,
}

impl MechanicService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }

    pub async fn list_mechanics(
        &self,
        query: MechanicQuery,
        page: &PageQuery,
        caller: Option<&IdentityClaim>,
    ) -> Result<Paginated<MechanicView>, AppError> {
        let admin = is_admin(caller);
        let include_inactive = admin && query.include_inactive;

        let mechanics = self
            .db
            .mechanics
            .filter(|m| include_inactive || m.active)
            .await;

        Ok(Paginated::from_items(mechanics, page).map(|m| view(m, admin)))
    }

    pub async fn get_mechanic(
        &self,
        mechanic_id: i64,
        caller: Option<&IdentityClaim>,
    ) -> Result<MechanicView, AppError> {
        let admin = is_admin(caller);
        let mechanic = self
            .db
            .mechanics
            .get(mechanic_id)
            .await
            .filter(|m| admin || m.active)
            .ok_or_else(|| not_found(mechanic_id))?;

        Ok(view(mechanic, admin))
    }

    pub async fn create_mechanic(&self, request: CreateMechanicRequest) -> Result<Mechanic, AppError> {
        debug!("Creating mechanic {}", request.name);

        let _relations = self.db.lock_relations().await;
        if let Some(user_id) = request.user_id {
            let user = self
                .db
                .users
                .get(user_id)
                .await
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
            if user.role != Role::Mecanico {
                return Err(AppError::ValidationError(
                    "Mechanic records can only be linked to MECANICO users".to_string(),
                ));
            }
        }

        let name = required("name", &request.name)?;
        let phone = optional(request.phone.as_deref(), normalize_phone)?;
        let email = optional(request.email.as_deref(), normalize_email)?;
        let specialty = optional(request.specialty.as_deref(), |s| Ok(s.to_string()))?;
        let user_id = request.user_id;

        let mechanic = self
            .db
            .mechanics
            .try_insert(|id, rows| {
                if user_id.is_some() && rows.values().any(|m| m.user_id == user_id) {
                    return Err(AppError::Conflict(
                        "This user is already linked to a mechanic".to_string(),
                    ));
                }
                let now = Utc::now();
                Ok(Mechanic {
                    id,
                    user_id,
                    name,
                    specialty,
                    phone,
                    email,
                    active: true,
                    created_at: now,
                    updated_at: now,
                })
            })
            .await?;

        info!("Created mechanic {}", mechanic.id);
        Ok(mechanic)
    }

    pub async fn update_mechanic(
        &self,
        mechanic_id: i64,
        request: UpdateMechanicRequest,
        caller: &IdentityClaim,
    ) -> Result<Mechanic, AppError> {
        let current = self
            .db
            .mechanics
            .get(mechanic_id)
            .await
            .ok_or_else(|| not_found(mechanic_id))?;
        authorize_owner(Some(caller), current.user_id)?;

        if request.active.is_some() && !caller.is_admin() {
            return Err(AppError::Forbidden(
                "Only administrators can change a mechanic's status".to_string(),
            ));
        }

        let name = request.name.as_deref().map(|n| required("name", n)).transpose()?;
        let phone = optional(request.phone.as_deref(), normalize_phone)?;
        let email = optional(request.email.as_deref(), normalize_email)?;

        let updated = self
            .db
            .mechanics
            .update(mechanic_id, |mechanic, _| {
                if let Some(name) = name {
                    mechanic.name = name;
                }
                if let Some(specialty) = request.specialty {
                    mechanic.specialty = Some(specialty.trim().to_string()).filter(|s| !s.is_empty());
                }
                if phone.is_some() {
                    mechanic.phone = phone;
                }
                if email.is_some() {
                    mechanic.email = email;
                }
                if let Some(active) = request.active {
                    mechanic.active = active;
                }
                mechanic.updated_at = Utc::now();
                Ok::<_, AppError>(())
            })
            .await?
            .ok_or_else(|| not_found(mechanic_id))?;

        info!("Updated mechanic {}", mechanic_id);
        Ok(updated)
    }

    /// Soft delete: the record stays for inspection history.
    pub async fn deactivate_mechanic(&self, mechanic_id: i64) -> Result<Mechanic, AppError> {
        let mechanic = self
            .db
            .mechanics
            .update(mechanic_id, |mechanic, _| {
                mechanic.active = false;
                mechanic.updated_at = Utc::now();
                Ok::<_, AppError>(())
            })
            .await?
            .ok_or_else(|| not_found(mechanic_id))?;

        info!("Deactivated mechanic {}", mechanic_id);
        Ok(mechanic)
    }
}
