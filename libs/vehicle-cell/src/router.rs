use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_models::auth::Role;
use shared_utils::extractor::{auth_middleware, require_roles};
use shared_utils::AppState;

use crate::handlers;

pub fn vehicle_routes(state: AppState) -> Router {
    let staff_routes = Router::new()
        .route("/", get(handlers::list_vehicles))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin, Role::Mecanico])));

    let create_routes = Router::new()
        .route("/", post(handlers::create_vehicle))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin, Role::Cliente])));

    let admin_routes = Router::new()
        .route("/{id}", delete(handlers::delete_vehicle))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin])));

    // Owner, mechanic and admin access is resolved through the owning client.
    let record_routes = Router::new()
        .route("/{id}", get(handlers::get_vehicle).put(handlers::update_vehicle))
        .route("/{id}/history", get(handlers::vehicle_history));

    Router::new()
        .merge(staff_routes)
        .merge(create_routes)
        .merge(admin_routes)
        .merge(record_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
