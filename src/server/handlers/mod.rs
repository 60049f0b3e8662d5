//! HTTP request handlers for the web server.

mod basket;
mod search;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub use basket::{add_item, get_items, remove_item};
pub use search::search;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    "ok"
}

/// A `{"message": ...}` body with the given status.
fn message(status: StatusCode, text: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "message": text.into() }))).into_response()
}
