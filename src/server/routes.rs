//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/search", get(handlers::search))
        // Basket
        .route("/api/add_item", post(handlers::add_item))
        .route("/api/get_items", get(handlers::get_items))
        .route("/api/remove_item", post(handlers::remove_item))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
