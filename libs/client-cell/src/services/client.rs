use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shared_database::Database;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_models::pagination::{PageQuery, Paginated};
use shared_models::workshop::{Client, Vehicle};
use shared_utils::extractor::authorize_owner;
use shared_utils::jwt::IdentityClaim;
use shared_utils::validators::{
    normalize_cep, normalize_cpf, normalize_email, normalize_phone, required,
};
use shared_utils::AppState;

use crate::models::{ClientSearchQuery, CreateClientRequest, UpdateClientRequest};

fn optional<F>(value: Option<&str>, normalize: F) -> Result<Option<String>, AppError>
where
    F: Fn(&str) -> Result<String, AppError>,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => normalize(v).map(Some),
        None => Ok(None),
    }
}

fn not_found(client_id: i64) -> AppError {
    AppError::NotFound(format!("Client {} not found", client_id))
}

pub struct ClientService {
    db: Arc<Database>,
}

impl ClientService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
        }
    }

    pub async fn list_clients(
        &self,
        query: ClientSearchQuery,
        page: &PageQuery,
    ) -> Result<Paginated<Client>, AppError> {
        let term = query
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let cpf_term: Option<String> = term
            .as_ref()
            .map(|t| t.chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|d| !d.is_empty());

        let clients = self
            .db
            .clients
            .filter(|c| match &term {
                None => true,
                Some(term) => {
                    c.name.to_lowercase().contains(term.as_str())
                        || cpf_term.as_ref().is_some_and(|d| c.cpf.contains(d.as_str()))
                }
            })
            .await;

        Ok(Paginated::from_items(clients, page))
    }

    async fn resolve_owner(
        &self,
        requested: Option<i64>,
        caller: &IdentityClaim,
    ) -> Result<Option<i64>, AppError> {
        if caller.has_role(Role::Cliente) {
            return Ok(Some(caller.user_id()));
        }

        let Some(user_id) = requested else {
            return Ok(None);
        };
        let user = self
            .db
            .users
            .get(user_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        if user.role != Role::Cliente {
            return Err(AppError::ValidationError(
                "Client records can only be linked to CLIENTE users".to_string(),
            ));
        }
        Ok(Some(user_id))
    }

    pub async fn create_client(
        &self,
        request: CreateClientRequest,
        caller: &IdentityClaim,
    ) -> Result<Client, AppError> {
        debug!("Creating client for caller {}", caller.user_id());

        let _relations = self.db.lock_relations().await;
        let user_id = self.resolve_owner(request.user_id, caller).await?;
        let name = required("name", &request.name)?;
        let cpf = normalize_cpf(&request.cpf)?;
        let phone = normalize_phone(&request.phone)?;
        let email = optional(request.email.as_deref(), normalize_email)?;
        let cep = optional(request.cep.as_deref(), normalize_cep)?;
        let address = optional(request.address.as_deref(), |a| Ok(a.to_string()))?;

        let client = self
            .db
            .clients
            .try_insert(|id, rows| {
                if rows.values().any(|c| c.cpf == cpf) {
                    return Err(AppError::Conflict(format!(
                        "A client with CPF {} already exists",
                        cpf
                    )));
                }
                if user_id.is_some() && rows.values().any(|c| c.user_id == user_id) {
                    return Err(AppError::Conflict(
                        "This user already has a client record".to_string(),
                    ));
                }
                let now = Utc::now();
                Ok(Client {
                    id,
                    user_id,
                    name,
                    cpf: cpf.clone(),
                    email,
                    phone,
                    cep,
                    address,
                    created_at: now,
                    updated_at: now,
                })
            })
            .await?;

        info!("Created client {}", client.id);
        Ok(client)
    }

    pub async fn get_own_client(&self, caller: &IdentityClaim) -> Result<Client, AppError> {
        self.db
            .client_for_user(caller.user_id())
            .await
            .ok_or_else(|| AppError::NotFound("You have no client record yet".to_string()))
    }

    pub async fn get_client(&self, client_id: i64, caller: &IdentityClaim) -> Result<Client, AppError> {
        let client = self.db.clients.get(client_id).await.ok_or_else(|| not_found(client_id))?;
        authorize_owner(Some(caller), client.user_id)?;
        Ok(client)
    }

    pub async fn update_client(
        &self,
        client_id: i64,
        request: UpdateClientRequest,
        caller: &IdentityClaim,
    ) -> Result<Client, AppError> {
        self.get_client(client_id, caller).await?;

        let name = request.name.as_deref().map(|n| required("name", n)).transpose()?;
        let cpf = request.cpf.as_deref().map(normalize_cpf).transpose()?;
        let phone = request.phone.as_deref().map(normalize_phone).transpose()?;
        let email = optional(request.email.as_deref(), normalize_email)?;
        let cep = optional(request.cep.as_deref(), normalize_cep)?;

        let updated = self
            .db
            .clients
            .update(client_id, |client, rows| {
                if let Some(cpf) = cpf {
                    if rows.values().any(|c| c.id != client_id && c.cpf == cpf) {
                        return Err(AppError::Conflict(format!(
                            "A client with CPF {} already exists",
                            cpf
                        )));
                    }
                    client.cpf = cpf;
                }
                if let Some(name) = name {
                    client.name = name;
                }
                if let Some(phone) = phone {
                    client.phone = phone;
                }
                if email.is_some() {
                    client.email = email;
                }
                if cep.is_some() {
                    client.cep = cep;
                }
                if let Some(address) = request.address {
                    client.address = Some(address.trim().to_string()).filter(|a| !a.is_empty());
                }
                client.updated_at = Utc::now();
                Ok(())
            })
            .await?
            .ok_or_else(|| not_found(client_id))?;

        info!("Updated client {}", client_id);
        Ok(updated)
    }

    pub async fn delete_client(&self, client_id: i64) -> Result<(), AppError> {
        let _relations = self.db.lock_relations().await;
        if self.db.vehicles.exists(|v| v.client_id == client_id).await {
            return Err(AppError::Conflict(
                "Client still has vehicles; remove them first".to_string(),
            ));
        }

        self.db
            .clients
            .remove(client_id)
            .await
            .ok_or_else(|| not_found(client_id))?;

        info!("Deleted client {}", client_id);
        Ok(())
    }

    pub async fn list_client_vehicles(
        &self,
        client_id: i64,
        caller: &IdentityClaim,
    ) -> Result<Vec<Vehicle>, AppError> {
        self.get_client(client_id, caller).await?;
        Ok(self.db.vehicles.filter(|v| v.client_id == client_id).await)
    }
}
