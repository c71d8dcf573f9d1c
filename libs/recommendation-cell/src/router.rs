use axum::{
    middleware,
    routing::{delete, get, patch},
    Router,
};

use shared_models::auth::Role;
use shared_utils::extractor::{auth_middleware, require_roles};
use shared_utils::AppState;

use crate::handlers;

pub fn recommendation_routes(state: AppState) -> Router {
    let staff_routes = Router::new()
        .route(
            "/",
            get(handlers::list_recommendations).post(handlers::create_recommendation),
        )
        .route("/{id}/resolve", patch(handlers::resolve_recommendation))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin, Role::Mecanico])));

    let admin_routes = Router::new()
        .route("/{id}", delete(handlers::delete_recommendation))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin])));

    // Clients may read recommendations for their own vehicles.
    let record_routes = Router::new().route("/{id}", get(handlers::get_recommendation));

    Router::new()
        .merge(staff_routes)
        .merge(admin_routes)
        .merge(record_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
