use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use shared_models::auth::Role;
use shared_utils::extractor::{auth_middleware, optional_auth_middleware, require_roles};
use shared_utils::AppState;

use crate::handlers;

pub fn mechanic_routes(state: AppState) -> Router {
    // Readable without a token; administrators get the full records.
    let public_routes = Router::new()
        .route("/", get(handlers::list_mechanics))
        .route("/{id}", get(handlers::get_mechanic))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth_middleware));

    let admin_routes = Router::new()
        .route("/", post(handlers::create_mechanic))
        .route("/{id}", delete(handlers::deactivate_mechanic))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin])));

    let protected_routes = Router::new()
        .route("/{id}", put(handlers::update_mechanic))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
