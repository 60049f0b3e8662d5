//! Product search endpoint.

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::super::AppState;
use super::message;
use crate::currency::{self, CurrencyRate};
use crate::models::Product;
use crate::services::{ResultSource, SearchError, SearchOutcome};

/// Search parameters.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search_term: Option<String>,
    /// Display currency by name or ISO code. Prices stay in euro when unset.
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<Product>,
    /// Rate table so clients can switch currency without searching again.
    currency: BTreeMap<&'static str, CurrencyRate>,
    source: ResultSource,
}

/// Ranked products for a search term.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let term = params.search_term.unwrap_or_default();

    if let Some(code) = params.currency.as_deref() {
        if let Err(e) = currency::find(code) {
            return message(StatusCode::BAD_REQUEST, e.to_string());
        }
    }

    match state.search.search(&term).await {
        Ok(SearchOutcome::Results {
            mut products,
            source,
        }) => {
            if let Some(code) = params.currency.as_deref() {
                if let Err(e) = currency::convert(&mut products, code) {
                    return message(StatusCode::BAD_REQUEST, e.to_string());
                }
            }
            info!(
                "Search for '{}' returned {} products ({})",
                term.trim(),
                products.len(),
                source.as_str()
            );
            Json(SearchResponse {
                results: products,
                currency: currency::rate_table(),
                source,
            })
            .into_response()
        }
        Ok(SearchOutcome::NoResults) => message(
            StatusCode::NOT_FOUND,
            format!("No products found for '{}'", term.trim()),
        ),
        Err(SearchError::EmptyTerm) => {
            message(StatusCode::BAD_REQUEST, "search_term is required")
        }
        Err(e) => {
            error!("Search for '{}' failed: {}", term.trim(), e);
            message(StatusCode::INTERNAL_SERVER_ERROR, "Search failed")
        }
    }
}
