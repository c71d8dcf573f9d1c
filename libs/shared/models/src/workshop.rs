use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    /// Login account that owns this record, if the client has one.
    pub user_id: Option<i64>,
    pub name: String,
    pub cpf: String,
    pub email: Option<String>,
    pub phone: String,
    pub cep: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub client_id: i64,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub mileage: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mechanic {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStatus {
    Agendada,
    EmAndamento,
    Concluida,
    Cancelada,
}

impl InspectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::Agendada => "AGENDADA",
            InspectionStatus::EmAndamento => "EM_ANDAMENTO",
            InspectionStatus::Concluida => "CONCLUIDA",
            InspectionStatus::Cancelada => "CANCELADA",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, InspectionStatus::Concluida | InspectionStatus::Cancelada)
    }

    pub fn can_transition_to(&self, next: InspectionStatus) -> bool {
        use InspectionStatus::*;
        matches!(
            (self, next),
            (Agendada, EmAndamento)
                | (Agendada, Cancelada)
                | (EmAndamento, Concluida)
                | (EmAndamento, Cancelada)
        )
    }
}

impl fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A revisão: one scheduled service of a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub id: i64,
    pub vehicle_id: i64,
    pub mechanic_id: Option<i64>,
    pub status: InspectionStatus,
    pub scheduled_at: DateTime<Utc>,
    pub description: Option<String>,
    pub mileage: Option<i64>,
    pub total_cost: Option<f64>,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Baixa,
    #[default]
    Media,
    Alta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: i64,
    pub inspection_id: i64,
    pub vehicle_id: i64,
    pub description: String,
    pub priority: Priority,
    pub due_mileage: Option<i64>,
    pub due_date: Option<NaiveDate>,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
