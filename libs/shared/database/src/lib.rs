pub mod table;
pub mod users;

use shared_models::auth::User;
use shared_models::workshop::{Client, Inspection, Mechanic, Recommendation, Vehicle};

use tokio::sync::{Mutex, MutexGuard};

pub use table::{Rows, Table};
pub use users::UserStore;

/// All application tables. Shared behind an `Arc` in the router state.
#[derive(Default)]
pub struct Database {
    pub users: Table<User>,
    pub clients: Table<Client>,
    pub vehicles: Table<Vehicle>,
    pub mechanics: Table<Mechanic>,
    pub inspections: Table<Inspection>,
    pub recommendations: Table<Recommendation>,
    relations: Mutex<()>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes writes that check one table and then write another, such as
    /// creating a child row or deleting a parent that must have no children.
    /// Single-table reads and updates do not need it.
    pub async fn lock_relations(&self) -> MutexGuard<'_, ()> {
        self.relations.lock().await
    }

    /// User id owning a client record, if the client exists and is linked to a login.
    pub async fn client_owner(&self, client_id: i64) -> Option<i64> {
        self.clients.get(client_id).await.and_then(|c| c.user_id)
    }

    pub async fn vehicle_owner(&self, vehicle_id: i64) -> Option<i64> {
        let vehicle = self.vehicles.get(vehicle_id).await?;
        self.client_owner(vehicle.client_id).await
    }

    pub async fn inspection_owner(&self, inspection_id: i64) -> Option<i64> {
        let inspection = self.inspections.get(inspection_id).await?;
        self.vehicle_owner(inspection.vehicle_id).await
    }

    pub async fn client_for_user(&self, user_id: i64) -> Option<Client> {
        self.clients.find(|c| c.user_id == Some(user_id)).await
    }

    pub async fn mechanic_for_user(&self, user_id: i64) -> Option<Mechanic> {
        self.mechanics.find(|m| m.user_id == Some(user_id)).await
    }
}
