//! Search service.
//!
//! Ties the seller fan-out, ranking and the search cache together. A fresh
//! cache entry is served without touching the sellers; a missing or expired
//! one triggers a fetch whose ranked products replace the cached set.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aggregate::{FetchOrchestrator, FetchPermits};
use crate::config::Settings;
use crate::models::Product;
use crate::ranking::rank;
use crate::repository::{DbError, SearchCache, SearchUnitOfWork};
use crate::scrapers::{HttpClient, ScrapingProxy};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search term is empty")]
    EmptyTerm,

    #[error("search cache error: {0}")]
    Cache(#[from] DbError),
}

/// Where a set of results came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Served from a cache entry that has not expired.
    Cache,
    /// Fetched from the sellers for this request.
    Fresh,
    /// An expired cache entry, served because a refresh found nothing.
    Stale,
}

impl ResultSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Fresh => "fresh",
            Self::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Results {
        products: Vec<Product>,
        source: ResultSource,
    },
    /// No seller returned anything and nothing usable was cached.
    NoResults,
}

/// Lower-case, trim and collapse internal whitespace.
///
/// The result is the cache key and the text sent to every seller.
pub fn normalize_search_term(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Service for answering product searches.
pub struct SearchService {
    orchestrator: FetchOrchestrator,
    cache: Option<SearchCache>,
    ttl_days: u64,
}

impl SearchService {
    /// Create a service backed by the search cache.
    pub fn new(orchestrator: FetchOrchestrator, cache: SearchCache, ttl_days: u64) -> Self {
        Self {
            orchestrator,
            cache: Some(cache),
            ttl_days,
        }
    }

    /// Create a service that scrapes and ranks on every search.
    pub fn scrape_only(orchestrator: FetchOrchestrator) -> Self {
        Self {
            orchestrator,
            cache: None,
            ttl_days: 0,
        }
    }

    /// Build the fetcher, sellers and cache described by `settings`.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let mut client = HttpClient::new(
            settings.request_timeout(),
            settings.request_delay(),
            settings.user_agent.as_deref(),
        )?
        .with_attempts(settings.fetch_attempts);

        match (&settings.proxy_url, &settings.proxy_api_key) {
            (Some(url), Some(key)) => {
                client = client.with_proxy(ScrapingProxy::new(url, key)?);
            }
            (Some(_), None) => warn!("Proxy URL set without an API key; fetching directly"),
            _ => {}
        }

        let orchestrator = FetchOrchestrator::new(
            Arc::new(client),
            settings.load_sellers()?,
            FetchPermits::new(settings.max_concurrent_fetches),
        )
        .with_seller_timeout(settings.seller_timeout());

        if settings.db_available {
            let cache = settings.create_db_context().searches();
            Ok(Self::new(orchestrator, cache, settings.search_expiry_days))
        } else {
            info!("Search cache disabled; every search scrapes the sellers");
            Ok(Self::scrape_only(orchestrator))
        }
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    pub fn orchestrator(&self) -> &FetchOrchestrator {
        &self.orchestrator
    }

    /// Search, serving a fresh cache entry when one exists.
    pub async fn search(&self, raw_term: &str) -> Result<SearchOutcome, SearchError> {
        self.run(raw_term, false).await
    }

    /// Search the sellers even if the cache holds a fresh entry.
    pub async fn search_uncached(&self, raw_term: &str) -> Result<SearchOutcome, SearchError> {
        self.run(raw_term, true).await
    }

    async fn run(&self, raw_term: &str, bypass_cache: bool) -> Result<SearchOutcome, SearchError> {
        let term = normalize_search_term(raw_term);
        if term.is_empty() {
            return Err(SearchError::EmptyTerm);
        }

        let Some(cache) = &self.cache else {
            let products = rank(self.orchestrator.fetch_all(&term).await);
            return Ok(results_or_none(products, ResultSource::Fresh));
        };

        let now = Utc::now();
        let cached = cache.lookup(&term).await?;

        if let Some(hit) = &cached {
            let expired = hit.entry.is_expired_at(now, self.ttl_days);
            debug!(
                "Cache entry for '{}': fetch {} ({})",
                term,
                hit.entry.fetch_count,
                if expired { "expired" } else { "fresh" }
            );
            if !expired && !bypass_cache && !hit.products.is_empty() {
                return Ok(SearchOutcome::Results {
                    products: rank(hit.products.clone()),
                    source: ResultSource::Cache,
                });
            }
        }

        let products = rank(self.orchestrator.fetch_all(&term).await);

        if products.is_empty() {
            return Ok(match cached {
                Some(stale) if !stale.products.is_empty() => {
                    warn!(
                        "No sellers returned results for '{}'; serving {} cached products from {}",
                        term,
                        stale.products.len(),
                        stale.entry.last_fetch
                    );
                    SearchOutcome::Results {
                        products: rank(stale.products),
                        source: ResultSource::Stale,
                    }
                }
                _ => SearchOutcome::NoResults,
            });
        }

        let committed = cache
            .commit(SearchUnitOfWork {
                search_term: term,
                products,
                fetched_at: now,
                ttl_days: self.ttl_days,
            })
            .await?;

        info!(
            "Cached {} products for '{}' (fetch {})",
            committed.products.len(),
            committed.entry.search_term,
            committed.entry.fetch_count
        );

        Ok(SearchOutcome::Results {
            products: committed.products,
            source: ResultSource::Fresh,
        })
    }
}

fn results_or_none(products: Vec<Product>, source: ResultSource) -> SearchOutcome {
    if products.is_empty() {
        SearchOutcome::NoResults
    } else {
        SearchOutcome::Results { products, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::tempdir;

    use crate::repository::DbContext;
    use crate::scrapers::{FetchError, PageFetcher};
    use crate::sellers::{builtin_descriptors, SellerRules};

    const TESCO_PAGE: &str = r#"
        <ul class="product-list">
          <li>
            <a href="/groceries/en-IE/products/1"></a>
            <span data-auto="product-tile--title">Whole Milk 2L</span>
            <p class="beans-price__text">€2.40</p>
            <p class="beans-price__subtext">€1.20/litre</p>
          </li>
          <li>
            <a href="/groceries/en-IE/products/2"></a>
            <span data-auto="product-tile--title">Low Fat Milk 1L</span>
            <p class="beans-price__text">€1.05</p>
            <p class="beans-price__subtext">€1.05/litre</p>
          </li>
        </ul>
    "#;

    /// Serves one page for every URL and counts requests.
    struct CountingFetcher {
        body: std::sync::Mutex<String>,
        calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new(body: &str) -> Self {
            Self {
                body: std::sync::Mutex::new(body.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn set_body(&self, body: &str) {
            *self.body.lock().unwrap() = body.to_string();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.lock().unwrap().clone())
        }
    }

    fn tesco_orchestrator(fetcher: Arc<CountingFetcher>) -> FetchOrchestrator {
        let tesco = builtin_descriptors()
            .into_iter()
            .find(|d| d.id == "tesco")
            .unwrap();
        let rules = Arc::new(SellerRules::compile(tesco).unwrap());
        FetchOrchestrator::new(fetcher, vec![rules], FetchPermits::new(2))
    }

    async fn cached_service(
        fetcher: Arc<CountingFetcher>,
    ) -> (SearchService, DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        let service = SearchService::new(tesco_orchestrator(fetcher), ctx.searches(), 7);
        (service, ctx, dir)
    }

    fn unwrap_results(outcome: SearchOutcome) -> (Vec<Product>, ResultSource) {
        match outcome {
            SearchOutcome::Results { products, source } => (products, source),
            SearchOutcome::NoResults => panic!("expected results"),
        }
    }

    #[test]
    fn test_normalize_search_term() {
        assert_eq!(normalize_search_term("  Whole   MILK "), "whole milk");
        assert_eq!(normalize_search_term("Ben & Jerry's"), "ben & jerry's");
        assert_eq!(normalize_search_term(" \t "), "");
    }

    #[tokio::test]
    async fn test_empty_term_rejected() {
        let fetcher = Arc::new(CountingFetcher::new(TESCO_PAGE));
        let service = SearchService::scrape_only(tesco_orchestrator(fetcher.clone()));

        assert!(matches!(
            service.search("   ").await,
            Err(SearchError::EmptyTerm)
        ));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_second_search_served_from_cache() {
        let fetcher = Arc::new(CountingFetcher::new(TESCO_PAGE));
        let (service, _ctx, _dir) = cached_service(fetcher.clone()).await;

        let (first, source) = unwrap_results(service.search("Milk").await.unwrap());
        assert_eq!(source, ResultSource::Fresh);
        assert_eq!(first[0].name, "Low Fat Milk 1L");
        assert!(first.iter().all(|p| p.id.is_some()));

        let (second, source) = unwrap_results(service.search("  milk ").await.unwrap());
        assert_eq!(source, ResultSource::Cache);
        assert_eq!(second, first);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_uncached_search_refreshes_entry() {
        let fetcher = Arc::new(CountingFetcher::new(TESCO_PAGE));
        let (service, ctx, _dir) = cached_service(fetcher.clone()).await;

        service.search("milk").await.unwrap();
        let (_, source) = unwrap_results(service.search_uncached("milk").await.unwrap());
        assert_eq!(source, ResultSource::Fresh);
        assert_eq!(fetcher.calls(), 2);

        let entry = ctx.searches().entry("milk").await.unwrap().unwrap();
        assert_eq!(entry.fetch_count, 2);
        assert_eq!(ctx.products().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cached_products_reranked_after_shared_row_reprices() {
        let fetcher = Arc::new(CountingFetcher::new(TESCO_PAGE));
        let (service, ctx, _dir) = cached_service(fetcher.clone()).await;

        let listed = |path: &str, unit_price: f64| {
            let url = format!("https://tesco.ie/{}", path);
            let mut p = Product::new("tesco", format!("Milk {}", path), url);
            p.price = unit_price;
            p.price_per_unit = unit_price;
            p
        };
        let now = Utc::now();
        let commit = |term: &str, products: Vec<Product>| SearchUnitOfWork {
            search_term: term.to_string(),
            products,
            fetched_at: now,
            ttl_days: 7,
        };

        ctx.searches()
            .commit(commit("milk", vec![listed("a", 1.0), listed("b", 2.0)]))
            .await
            .unwrap();
        // Another term's fetch updates the row "milk" also lists
        ctx.searches()
            .commit(commit("whole milk", vec![listed("a", 3.0)]))
            .await
            .unwrap();

        let (products, source) = unwrap_results(service.search("milk").await.unwrap());
        assert_eq!(source, ResultSource::Cache);
        let names: Vec<_> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Milk b", "Milk a"]);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_results_when_refresh_finds_nothing() {
        let fetcher = Arc::new(CountingFetcher::new(TESCO_PAGE));
        let (service, _ctx, _dir) = cached_service(fetcher.clone()).await;

        service.search("milk").await.unwrap();
        fetcher.set_body("<html><body>maintenance</body></html>");

        let (products, source) = unwrap_results(service.search_uncached("milk").await.unwrap());
        assert_eq!(source, ResultSource::Stale);
        assert_eq!(products.len(), 2);
    }

    #[tokio::test]
    async fn test_no_results_without_cache() {
        let fetcher = Arc::new(CountingFetcher::new("<html></html>"));
        let (service, ctx, _dir) = cached_service(fetcher).await;

        assert!(matches!(
            service.search("caviar").await.unwrap(),
            SearchOutcome::NoResults
        ));
        assert!(ctx.searches().entry("caviar").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scrape_only_ranks_without_ids() {
        let fetcher = Arc::new(CountingFetcher::new(TESCO_PAGE));
        let service = SearchService::scrape_only(tesco_orchestrator(fetcher.clone()));
        assert!(!service.is_caching());

        let (products, source) = unwrap_results(service.search("milk").await.unwrap());
        assert_eq!(source, ResultSource::Fresh);
        assert_eq!(products[0].price_per_unit, 1.05);
        assert!(products.iter().all(|p| p.id.is_none()));

        service.search("milk").await.unwrap();
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_result_source_serializes_lowercase() {
        for source in [ResultSource::Cache, ResultSource::Fresh, ResultSource::Stale] {
            assert_eq!(
                serde_json::to_string(&source).unwrap(),
                format!("\"{}\"", source.as_str())
            );
        }
    }
}
