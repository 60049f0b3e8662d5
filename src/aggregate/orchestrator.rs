//! Fan-out of one fetch-and-extract task per seller, joined before ranking.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::permits::FetchPermits;
use crate::models::Product;
use crate::scrapers::{extract_from_html, FetchError, PageFetcher};
use crate::sellers::SellerRules;

/// Upper bound on one seller's fetch, including time spent waiting for a slot.
pub const DEFAULT_SELLER_TIMEOUT: Duration = Duration::from_secs(30);

/// What one seller contributed to a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum SellerOutcome {
    Products(usize),
    NoListings,
    FetchFailed(String),
    TimedOut,
    Crashed(String),
}

#[derive(Debug, Clone)]
pub struct SellerReport {
    pub seller: String,
    pub outcome: SellerOutcome,
}

/// Runs every seller's search concurrently and merges the results.
///
/// A failing seller contributes nothing; it never fails the whole fetch.
#[derive(Clone)]
pub struct FetchOrchestrator {
    fetcher: Arc<dyn PageFetcher>,
    sellers: Vec<Arc<SellerRules>>,
    permits: FetchPermits,
    seller_timeout: Duration,
}

impl FetchOrchestrator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        sellers: Vec<Arc<SellerRules>>,
        permits: FetchPermits,
    ) -> Self {
        Self {
            fetcher,
            sellers,
            permits,
            seller_timeout: DEFAULT_SELLER_TIMEOUT,
        }
    }

    pub fn with_seller_timeout(mut self, timeout: Duration) -> Self {
        self.seller_timeout = timeout;
        self
    }

    pub fn sellers(&self) -> &[Arc<SellerRules>] {
        &self.sellers
    }

    /// Fetch `term` from every seller; products are concatenated in seller
    /// order, each seller's listings in page order.
    pub async fn fetch_all(&self, term: &str) -> Vec<Product> {
        self.fetch_all_with_report(term).await.0
    }

    /// Like `fetch_all`, also returning what each seller contributed.
    pub async fn fetch_all_with_report(&self, term: &str) -> (Vec<Product>, Vec<SellerReport>) {
        let handles: Vec<_> = self
            .sellers
            .iter()
            .map(|rules| {
                let fetcher = self.fetcher.clone();
                let permits = self.permits.clone();
                let rules = rules.clone();
                let url = rules.search_url(term);
                let timeout = self.seller_timeout;

                tokio::spawn(async move {
                    tokio::time::timeout(timeout, fetch_seller(fetcher, rules, permits, url)).await
                })
            })
            .collect();

        let results = futures::future::join_all(handles).await;

        let mut products = Vec::new();
        let mut reports = Vec::with_capacity(self.sellers.len());

        for (rules, result) in self.sellers.iter().zip(results) {
            let seller = rules.id();
            let outcome = match result {
                Ok(Ok(Ok(found))) if found.is_empty() => {
                    warn!("{}: no listings extracted", seller);
                    SellerOutcome::NoListings
                }
                Ok(Ok(Ok(found))) => {
                    info!("{}: {} products", seller, found.len());
                    let count = found.len();
                    products.extend(found);
                    SellerOutcome::Products(count)
                }
                Ok(Ok(Err(e))) => {
                    warn!("{}: fetch failed: {}", seller, e);
                    SellerOutcome::FetchFailed(e.to_string())
                }
                Ok(Err(_)) => {
                    warn!("{}: timed out after {:?}", seller, self.seller_timeout);
                    SellerOutcome::TimedOut
                }
                Err(e) => {
                    warn!("{}: task failed: {}", seller, e);
                    SellerOutcome::Crashed(e.to_string())
                }
            };
            reports.push(SellerReport {
                seller: seller.to_string(),
                outcome,
            });
        }

        (products, reports)
    }
}

async fn fetch_seller(
    fetcher: Arc<dyn PageFetcher>,
    rules: Arc<SellerRules>,
    permits: FetchPermits,
    url: String,
) -> Result<Vec<Product>, FetchError> {
    let _permit = permits
        .acquire()
        .await
        .map_err(|e| FetchError::Other(e.to_string()))?;

    let body = fetcher.fetch(&url).await?;
    Ok(extract_from_html(&body, &rules))
}
