use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_models::auth::Role;
use shared_utils::extractor::{auth_middleware, last_path_id, require_owner_or_admin, require_roles};
use shared_utils::rate_limit::rate_limit_middleware;
use shared_utils::AppState;

use crate::handlers;

pub fn auth_routes(state: AppState) -> Router {
    let login_routes = Router::new()
        .route("/login", post(handlers::login))
        .route_layer(middleware::from_fn_with_state(
            state.login_limiter.clone(),
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/refresh", post(handlers::refresh))
        .merge(login_routes);

    let protected_routes = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

pub fn user_routes(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route("/{id}", delete(handlers::delete_user))
        .route_layer(middleware::from_fn(require_roles(&[Role::Admin])));

    let owner_routes = Router::new()
        .route("/{id}", get(handlers::get_user).put(handlers::update_user))
        .route_layer(middleware::from_fn(require_owner_or_admin(last_path_id)));

    Router::new()
        .merge(admin_routes)
        .merge(owner_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
