//! HTTP page fetching for seller search pages.

mod user_agent;

pub use user_agent::{resolve_user_agent, DEFAULT_USER_AGENT};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::rate_limiter::RateLimiter;

/// Pause before the first retry; doubles for each later one.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(8);

/// Pause before retrying after `failed_attempt` (1-based) failed.
fn retry_delay(base: Duration, failed_attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(failed_attempt.saturating_sub(1));
    base.saturating_mul(factor).min(RETRY_MAX_DELAY)
}

/// Failure to obtain a page body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("invalid proxy URL {0:?}")]
    InvalidProxy(String),
    #[error("{0}")]
    Other(String),
}

/// Source of page bodies for a fully formed seller URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Scraping proxy that takes the target as a query parameter.
///
/// Requests go to `endpoint?api_key=KEY&url=TARGET`.
#[derive(Debug, Clone)]
pub struct ScrapingProxy {
    endpoint: String,
    api_key: String,
}

impl ScrapingProxy {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, FetchError> {
        Url::parse(endpoint).map_err(|_| FetchError::InvalidProxy(endpoint.to_string()))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// URL that fetches `target` through the proxy.
    pub fn wrap(&self, target: &str) -> Result<String, FetchError> {
        Url::parse_with_params(
            &self.endpoint,
            &[("api_key", self.api_key.as_str()), ("url", target)],
        )
        .map(|u| u.to_string())
        .map_err(|_| FetchError::InvalidProxy(self.endpoint.clone()))
    }
}

/// HTTP client with bounded retries and per-domain adaptive rate limiting.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_delay: Duration,
    attempts: u32,
    retry_delay: Duration,
    proxy: Option<ScrapingProxy>,
    rate_limiter: RateLimiter,
}

impl HttpClient {
    /// Create a new HTTP client.
    /// `user_agent` follows `resolve_user_agent`; a rotated agent is chosen
    /// here and kept for every request this client sends.
    pub fn new(
        timeout: Duration,
        request_delay: Duration,
        user_agent: Option<&str>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent))
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            request_delay,
            attempts: 2,
            retry_delay: RETRY_BASE_DELAY,
            proxy: None,
            rate_limiter: RateLimiter::new(),
        })
    }

    /// Number of attempts per page (minimum 1).
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Base pause between attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Route requests through a scraping proxy.
    pub fn with_proxy(mut self, proxy: ScrapingProxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Share a rate limiter with other clients.
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Get the rate limiter for this client.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// One GET of `url`, reporting the status to the rate limiter.
    async fn get_once(&self, url: &str) -> Result<String, FetchError> {
        // Paced by the seller's host even when the request goes via the proxy
        let host = self.rate_limiter.wait_turn(url).await;

        let request_url = match &self.proxy {
            Some(proxy) => proxy.wrap(url)?,
            None => url.to_string(),
        };

        let response = self.client.get(&request_url).send().await?;
        let status_code = response.status().as_u16();
        if let Some(ref host) = host {
            self.rate_limiter.record(host, status_code).await;
        }

        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status_code,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 1;
        loop {
            match self.get_once(url).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) if attempt < self.attempts => {
                    let pause = retry_delay(self.retry_delay, attempt);
                    warn!(
                        "Fetch of {} failed (attempt {}/{}): {}; retrying in {:?}",
                        url, attempt, self.attempts, e, pause
                    );
                    tokio::time::sleep(pause).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_wraps_target() {
        let proxy = ScrapingProxy::new("https://proxy.example/v1/", "secret").unwrap();
        let wrapped = proxy
            .wrap("https://www.tesco.ie/groceries/en-IE/search?query=milk&page=1")
            .unwrap();

        let parsed = Url::parse(&wrapped).unwrap();
        assert_eq!(parsed.host_str(), Some("proxy.example"));
        let params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(
            params,
            vec![
                ("api_key".to_string(), "secret".to_string()),
                (
                    "url".to_string(),
                    "https://www.tesco.ie/groceries/en-IE/search?query=milk&page=1".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_invalid_proxy_endpoint() {
        assert!(matches!(
            ScrapingProxy::new("not a url", "k"),
            Err(FetchError::InvalidProxy(_))
        ));
    }

    #[test]
    fn test_attempts_floor() {
        let client = HttpClient::new(Duration::from_secs(5), Duration::ZERO, None)
            .unwrap()
            .with_attempts(0);
        assert_eq!(client.attempts, 1);
    }

    #[test]
    fn test_retry_delay_doubles_up_to_cap() {
        assert_eq!(retry_delay(RETRY_BASE_DELAY, 1), Duration::from_millis(500));
        assert_eq!(retry_delay(RETRY_BASE_DELAY, 2), Duration::from_secs(1));
        assert_eq!(retry_delay(RETRY_BASE_DELAY, 3), Duration::from_secs(2));
        assert_eq!(retry_delay(RETRY_BASE_DELAY, 40), RETRY_MAX_DELAY);
        assert_eq!(retry_delay(Duration::ZERO, 3), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_failed_fetch_pauses_between_attempts() {
        let client = HttpClient::new(Duration::from_secs(1), Duration::ZERO, None)
            .unwrap()
            .with_attempts(3)
            .with_retry_delay(Duration::from_millis(40));

        // Nothing listens on port 9 locally, so every attempt fails fast
        let started = std::time::Instant::now();
        let result = client.fetch("http://127.0.0.1:9/search?q=milk").await;

        assert!(result.is_err());
        assert!(started.elapsed() >= Duration::from_millis(120));
    }
}
