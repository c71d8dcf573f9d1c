use serde::{Deserialize, Serialize};

use shared_models::workshop::Mechanic;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMechanicRequest {
    pub user_id: Option<i64>,
    pub name: String,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMechanicRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MechanicQuery {
    /// Honoured for administrators only.
    #[serde(default)]
    pub include_inactive: bool,
}

/// What anonymous and non-admin callers see: no contact details.
#[derive(Debug, Clone, Serialize)]
pub struct PublicMechanic {
    pub id: i64,
    pub name: String,
    pub specialty: Option<String>,
    pub active: bool,
}

impl From<Mechanic> for PublicMechanic {
    fn from(mechanic: Mechanic) -> Self {
        Self {
            id: mechanic.id,
            name: mechanic.name,
            specialty: mechanic.specialty,
            active: mechanic.active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MechanicView {
    Full(Mechanic),
    Public(PublicMechanic),
}
