//! Basket endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

use super::super::AppState;
use super::message;
use crate::models::Product;
use crate::repository::{BasketError, BasketRepository};

/// Header carrying the caller's client id.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

fn client_id(headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            message(
                StatusCode::BAD_REQUEST,
                format!("missing {} header", CLIENT_ID_HEADER),
            )
        })
}

fn baskets(state: &AppState) -> Result<Arc<BasketRepository>, Response> {
    state.baskets.clone().ok_or_else(|| {
        message(
            StatusCode::SERVICE_UNAVAILABLE,
            "Baskets are unavailable at this time",
        )
    })
}

fn product_id(product: &Product) -> Result<i64, Response> {
    product
        .id
        .ok_or_else(|| message(StatusCode::BAD_REQUEST, "product id is required"))
}

/// Add a searched product to the caller's basket.
pub async fn add_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(product): Json<Product>,
) -> Response {
    let (repo, client, id) = match (baskets(&state), client_id(&headers), product_id(&product)) {
        (Ok(repo), Ok(client), Ok(id)) => (repo, client, id),
        (Err(resp), _, _) | (_, Err(resp), _) | (_, _, Err(resp)) => return resp,
    };

    debug!("Adding product {} to basket of {}", id, client);
    match repo.add(&client, id).await {
        Ok(_) => message(
            StatusCode::OK,
            format!("Product added to basket: {}", product.name),
        ),
        Err(BasketError::UnknownProduct(id)) => message(
            StatusCode::NOT_FOUND,
            format!("Product {} not found", id),
        ),
        Err(e) => {
            error!("Failed to add product {} to basket: {}", id, e);
            message(StatusCode::INTERNAL_SERVER_ERROR, "Could not add this product")
        }
    }
}

/// List the caller's basket.
pub async fn get_items(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (repo, client) = match (baskets(&state), client_id(&headers)) {
        (Ok(repo), Ok(client)) => (repo, client),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    match repo.list(&client).await {
        Ok(items) => {
            let results: Vec<Product> = items.into_iter().map(|item| item.product).collect();
            Json(serde_json::json!({ "results": results })).into_response()
        }
        Err(e) => {
            error!("Failed to list basket: {}", e);
            message(StatusCode::INTERNAL_SERVER_ERROR, "Could not load basket")
        }
    }
}

/// Remove a product from the caller's basket.
pub async fn remove_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(product): Json<Product>,
) -> Response {
    let (repo, client, id) = match (baskets(&state), client_id(&headers), product_id(&product)) {
        (Ok(repo), Ok(client), Ok(id)) => (repo, client, id),
        (Err(resp), _, _) | (_, Err(resp), _) | (_, _, Err(resp)) => return resp,
    };

    match repo.remove(&client, id).await {
        Ok(true) => message(
            StatusCode::OK,
            format!("Product removed from basket: {}", product.name),
        ),
        Ok(false) => message(
            StatusCode::NOT_FOUND,
            format!("Product {} is not in the basket", id),
        ),
        Err(e) => {
            error!("Failed to remove product {} from basket: {}", id, e);
            message(StatusCode::INTERNAL_SERVER_ERROR, "Could not remove this product")
        }
    }
}
