use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::Database;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_models::pagination::{PageQuery, Paginated};
use shared_utils::jwt::IdentityClaim;
use shared_utils::password::{hash_password, validate_password_strength};
use shared_utils::validators::{normalize_email, required};
use shared_utils::AppState;

use crate::models::{CreateUserRequest, RegisterRequest, UpdateUserRequest, UserFilter};

pub struct UserService {
    db: Arc<Database>,
    hash_cost: u32,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            hash_cost: state.config.password_hash_cost,
        }
    }

    async fn hash(&self, password: &str) -> Result<String, AppError> {
        validate_password_strength(password)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        let password = password.to_string();
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing panicked: {}", e)))?
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let name = required("name", name)?;
        let email = normalize_email(email)?;
        let password_hash = self.hash(password).await?;

        let user = self
            .db
            .users
            .try_insert(|id, rows| {
                if rows.values().any(|u| u.email == email) {
                    return Err(AppError::Conflict(format!(
                        "A user with email {} already exists",
                        email
                    )));
                }
                let now = Utc::now();
                Ok(User {
                    id,
                    name,
                    email: email.clone(),
                    password_hash,
                    role,
                    created_at: now,
                    updated_at: now,
                })
            })
            .await?;

        info!("Created {} user {}", user.role, user.id);
        Ok(user)
    }

    /// Self-service sign-up. Always creates a CLIENTE.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        debug!("Registering {}", request.email);
        self.insert_user(&request.name, &request.email, &request.password, Role::Cliente)
            .await
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, AppError> {
        self.insert_user(&request.name, &request.email, &request.password, request.role)
            .await
    }

    pub async fn list_users(
        &self,
        filter: UserFilter,
        page: &PageQuery,
    ) -> Result<Paginated<User>, AppError> {
        let users = self
            .db
            .users
            .filter(|u| filter.role.map_or(true, |role| u.role == role))
            .await;
        Ok(Paginated::from_items(users, page))
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, AppError> {
        self.db
            .users
            .get(user_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    pub async fn update_user(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
        caller: &IdentityClaim,
    ) -> Result<User, AppError> {
        if request.role.is_some() && !caller.is_admin() {
            return Err(AppError::Forbidden(
                "Only administrators can change roles".to_string(),
            ));
        }

        let name = request.name.as_deref().map(|n| required("name", n)).transpose()?;
        let email = request.email.as_deref().map(normalize_email).transpose()?;
        let password_hash = match request.password.as_deref() {
            Some(password) => Some(self.hash(password).await?),
            None => None,
        };

        let updated = self
            .db
            .users
            .update(user_id, |user, rows| {
                if let Some(email) = email {
                    if rows.values().any(|u| u.id != user_id && u.email == email) {
                        return Err(AppError::Conflict(format!(
                            "A user with email {} already exists",
                            email
                        )));
                    }
                    user.email = email;
                }
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(hash) = password_hash {
                    user.password_hash = hash;
                }
                if let Some(role) = request.role {
                    user.role = role;
                }
                user.updated_at = Utc::now();
                Ok(())
            })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        info!("Updated user {}", user_id);
        Ok(updated)
    }

    /// Deletes an account and unlinks the client and mechanic records it owned.
    pub async fn delete_user(&self, user_id: i64, caller: &IdentityClaim) -> Result<(), AppError> {
        if caller.user_id() == user_id {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }

        let _relations = self.db.lock_relations().await;
        self.db
            .users
            .remove(user_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        for client in self.db.clients.filter(|c| c.user_id == Some(user_id)).await {
            self.db
                .clients
                .update(client.id, |c, _| {
                    c.user_id = None;
                    Ok::<_, AppError>(())
                })
                .await?;
        }
        for mechanic in self.db.mechanics.filter(|m| m.user_id == Some(user_id)).await {
            self.db
                .mechanics
                .update(mechanic.id, |m, _| {
                    m.user_id = None;
                    Ok::<_, AppError>(())
                })
                .await?;
        }

        info!("Deleted user {}", user_id);
        Ok(())
    }

    /// Creates the configured administrator unless that email already exists.
    pub async fn ensure_admin(&self, config: &AppConfig) -> Result<Option<User>, AppError> {
        let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
            return Ok(None);
        };

        let normalized = normalize_email(email)?;
        if let Some(existing) = self.db.users.find(|u| u.email == normalized).await {
            if existing.role != Role::Admin {
                warn!("Bootstrap admin email {} belongs to a {} user", normalized, existing.role);
            }
            return Ok(None);
        }

        let admin = self
            .insert_user(&config.admin_name, &normalized, password, Role::Admin)
            .await?;
        info!("Bootstrapped administrator {}", admin.email);
        Ok(Some(admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_models::auth::TokenKind;
    use shared_utils::test_utils::{TestConfig, TestUser};

    fn claim(state: &AppState, user: &TestUser) -> IdentityClaim {
        let token = state.tokens.issue_access_token(&user.identity()).unwrap();
        state.tokens.verify(&token, TokenKind::Access).unwrap()
    }

    fn register(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Joana".to_string(),
            email: email.to_string(),
            password: "Senha123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_cliente_with_normalized_email() {
        let state = TestConfig::default().to_state();
        let service = UserService::new(&state);

        let user = service.register(register(" Joana@Test.com ")).await.unwrap();
        assert_eq!(user.role, Role::Cliente);
        assert_eq!(user.email, "joana@test.com");
        assert_ne!(user.password_hash, "Senha123");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_weak_passwords() {
        let state = TestConfig::default().to_state();
        let service = UserService::new(&state);

        service.register(register("joana@test.com")).await.unwrap();
        assert_matches!(
            service.register(register("JOANA@test.com")).await,
            Err(AppError::Conflict(_))
        );

        let mut weak = register("outra@test.com");
        weak.password = "curta".to_string();
        assert_matches!(service.register(weak).await, Err(AppError::ValidationError(_)));

        assert_matches!(
            service.register(register("sem-arroba")).await,
            Err(AppError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn test_only_admin_changes_role() {
        let state = TestConfig::default().to_state();
        let service = UserService::new(&state);
        let stored = service.register(register("joana@test.com")).await.unwrap();

        let mut owner = TestUser::cliente("joana@test.com");
        owner.id = stored.id;
        let escalate = UpdateUserRequest {
            role: Some(Role::Admin),
            ..Default::default()
        };
        assert_matches!(
            service.update_user(stored.id, escalate.clone(), &claim(&state, &owner)).await,
            Err(AppError::Forbidden(_))
        );

        let admin = TestUser::admin("admin@test.com");
        let updated = service
            .update_user(stored.id, escalate, &claim(&state, &admin))
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let state = TestConfig::default().to_state();
        let service = UserService::new(&state);
        service.register(register("a@test.com")).await.unwrap();
        let second = service.register(register("b@test.com")).await.unwrap();
        let admin = TestUser::admin("admin@test.com");

        let request = UpdateUserRequest {
            email: Some("A@test.com".to_string()),
            ..Default::default()
        };
        assert_matches!(
            service.update_user(second.id, request, &claim(&state, &admin)).await,
            Err(AppError::Conflict(_))
        );
        assert_eq!(service.get_user(second.id).await.unwrap().email, "b@test.com");
    }

    #[tokio::test]
    async fn test_delete_user() {
        let state = TestConfig::default().to_state();
        let service = UserService::new(&state);
        let user = service.register(register("a@test.com")).await.unwrap();

        let admin = TestUser::admin("admin@test.com");
        let admin_claim = claim(&state, &admin);
        assert_matches!(
            service.delete_user(admin.id, &admin_claim).await,
            Err(AppError::BadRequest(_))
        );

        service.delete_user(user.id, &admin_claim).await.unwrap();
        assert_matches!(service.get_user(user.id).await, Err(AppError::NotFound(_)));

        assert_matches!(
            service.delete_user(user.id, &admin_claim).await,
            Err(AppError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let mut config = TestConfig::default().to_app_config();
        config.admin_email = Some("Admin@Checar.com".to_string());
        config.admin_password = Some("Admin1234".to_string());
        let state = AppState::new(config.clone());
        let service = UserService::new(&state);

        let admin = service.ensure_admin(&config).await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.email, "admin@checar.com");

        assert!(service.ensure_admin(&config).await.unwrap().is_none());
        assert_eq!(state.db.users.len().await, 1);
    }

    #[tokio::test]
    async fn test_list_users_filters_by_role() {
        let state = TestConfig::default().to_state();
        let service = UserService::new(&state);
        service.register(register("a@test.com")).await.unwrap();
        service
            .create_user(CreateUserRequest {
                name: "Carlos".to_string(),
                email: "carlos@test.com".to_string(),
                password: "Oficina1".to_string(),
                role: Role::Mecanico,
            })
            .await
            .unwrap();

        let page = PageQuery::default();
        let all = service.list_users(UserFilter::default(), &page).await.unwrap();
        assert_eq!(all.pagination.total, 2);

        let mechanics = service
            .list_users(UserFilter { role: Some(Role::Mecanico) }, &page)
            .await
            .unwrap();
        assert_eq!(mechanics.data.len(), 1);
        assert_eq!(mechanics.data[0].email, "carlos@test.com");
    }
}
