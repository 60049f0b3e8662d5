//! Page fetching and listing extraction.

pub mod extract;
pub mod http_client;
pub mod rate_limiter;

pub use extract::{extract_from_html, extract_listing, extract_products, resolve_url, Listings};
pub use http_client::{FetchError, HttpClient, PageFetcher, ScrapingProxy};
pub use rate_limiter::{RateLimitConfig, RateLimiter, ResponseClass};
