//! HTTP API for searches and baskets.
//!
//! Thin glue over the search service and the basket repository. Clients
//! identify themselves with the `x-client-id` header.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::repository::BasketRepository;
use crate::services::SearchService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    /// Unset when persistence is disabled.
    pub baskets: Option<Arc<BasketRepository>>,
}

impl AppState {
    pub fn new(search: SearchService, baskets: Option<BasketRepository>) -> Self {
        Self {
            search: Arc::new(search),
            baskets: baskets.map(Arc::new),
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let search = SearchService::from_settings(settings)?;
        let baskets = settings
            .db_available
            .then(|| settings.create_db_context().baskets());
        Ok(Self::new(search, baskets))
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
