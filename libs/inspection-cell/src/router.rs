use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_models::auth::Role;
use shared_utils::extractor::{auth_middleware, require_roles};
use shared_utils::AppState;

use crate::handlers;

pub fn inspection_routes(state: AppState) -> Router {
    let staff_routes = Router::new()
        .route("/", get(handlers::list_inspections))
        .route("/{id}/status", patch(handlers::update_status))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin, Role::Mecanico])));

    let schedule_routes = Router::new()
        .route("/", post(handlers::schedule_inspection))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin, Role::Cliente])));

    let admin_routes = Router::new()
        .route("/{id}", delete(handlers::delete_inspection))
        .route("/{id}/assign", put(handlers::assign_mechanic))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin])));

    let record_routes = Router::new().route("/{id}", get(handlers::get_inspection));

    Router::new()
        .merge(staff_routes)
        .merge(schedule_routes)
        .merge(admin_routes)
        .merge(record_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
