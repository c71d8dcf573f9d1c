use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_models::auth::Role;
use shared_utils::extractor::{auth_middleware, require_roles};
use shared_utils::AppState;

use crate::handlers;

/// `/clients`. Ownership of a single record is checked once it is loaded.
pub fn client_routes(state: AppState) -> Router {
    let staff_routes = Router::new()
        .route("/", get(handlers::list_clients))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin, Role::Mecanico])));

    let create_routes = Router::new()
        .route("/", post(handlers::create_client))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin, Role::Cliente])));

    let cliente_routes = Router::new()
        .route("/me", get(handlers::get_my_client))
        .route_layer(middleware::from_fn(require_roles(&[Role::Cliente])));

    let admin_routes = Router::new()
        .route("/{id}", delete(handlers::delete_client))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin])));

    let owner_routes = Router::new()
        .route("/{id}", get(handlers::get_client).put(handlers::update_client))
        .route("/{id}/vehicles", get(handlers::list_client_vehicles));

    Router::new()
        .merge(staff_routes)
        .merge(create_routes)
        .merge(cliente_routes)
        .merge(admin_routes)
        .merge(owner_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
