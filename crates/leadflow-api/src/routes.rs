//! Route table.

use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::monitoring;
use crate::state::ApiState;
use crate::websocket;

pub fn create_router(state: Arc<ApiState>) -> Router {
    let api_routes = Router::new()
        .route("/commands", post(handlers::run_command))
        .route("/state", get(handlers::get_state))
        .route("/logs", get(handlers::get_logs))
        .route("/config", get(handlers::get_config))
        .route("/events", get(websocket::events_handler));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(monitoring::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
