use std::any::Any;

use axum::{
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{error, Level};

use auth_cell::{auth_routes, user_routes};
use client_cell::client_routes;
use inspection_cell::inspection_routes;
use mechanic_cell::mechanic_routes;
use recommendation_cell::recommendation_routes;
use vehicle_cell::vehicle_routes;
use shared_models::error::AppError;
use shared_utils::rate_limit::{rate_limit_middleware, RateLimiter};
use shared_utils::request_id::request_id_middleware;
use shared_utils::AppState;

async fn banner() -> &'static str {
    "CHECAR API is running!"
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn fallback() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Handler panicked: {}", detail);
    AppError::Internal(detail).into_response()
}

/// Builds the full application: every cell nested under its prefix, behind
/// the global rate limit, request ids, tracing and CORS.
pub fn create_router(state: AppState, limiter: RateLimiter) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/users", user_routes(state.clone()))
        .nest("/clients", client_routes(state.clone()))
        .nest("/vehicles", vehicle_routes(state.clone()))
        .nest("/mechanics", mechanic_routes(state.clone()))
        .nest("/inspections", inspection_routes(state.clone()))
        .nest("/recommendations", recommendation_routes(state))
        .fallback(fallback)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
}
