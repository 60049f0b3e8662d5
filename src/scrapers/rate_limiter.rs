//! Per-host request pacing for seller sites.
//!
//! Every host keeps its own minimum gap between requests. Throttling
//! responses (429, 503) double the gap up to a ceiling and other 5xx widen
//! it by half; a streak of successes shrinks it back toward the base gap.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Pacing parameters shared by every host.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Gap between requests to a host that is behaving normally.
    pub base_gap: Duration,
    /// Smallest gap recovery may shrink to.
    pub floor: Duration,
    /// Largest gap backoff may grow to.
    pub ceiling: Duration,
    pub throttle_factor: f64,
    pub server_error_factor: f64,
    /// Applied once per completed success streak; below 1.0.
    pub recovery_factor: f64,
    pub recovery_streak: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_gap: Duration::from_millis(250),
            floor: Duration::from_millis(100),
            ceiling: Duration::from_secs(30),
            throttle_factor: 2.0,
            server_error_factor: 1.5,
            recovery_factor: 0.8,
            recovery_streak: 3,
        }
    }
}

/// How a response status affects pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    Throttled,
    ServerError,
    /// Redirects and 4xx other than 429 leave pacing alone.
    Neutral,
}

impl ResponseClass {
    pub fn from_status(status: u16) -> Self {
        match status {
            429 | 503 => ResponseClass::Throttled,
            500..=599 => ResponseClass::ServerError,
            200..=299 => ResponseClass::Success,
            _ => ResponseClass::Neutral,
        }
    }
}

#[derive(Debug, Clone)]
struct HostPacing {
    gap: Duration,
    /// When the most recent request was (or is scheduled to be) sent.
    last_sent: Option<Instant>,
    streak: u32,
    backing_off: bool,
}

impl HostPacing {
    fn new(gap: Duration) -> Self {
        Self {
            gap,
            last_sent: None,
            streak: 0,
            backing_off: false,
        }
    }

    fn wait_at(&self, now: Instant) -> Duration {
        self.last_sent
            .map(|last| (last + self.gap).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    fn scale(&mut self, factor: f64, config: &RateLimitConfig) {
        let scaled = Duration::from_secs_f64(self.gap.as_secs_f64() * factor);
        self.gap = scaled.clamp(config.floor, config.ceiling);
    }
}

/// Adaptive per-host rate limiter.
///
/// Clones share the same host table.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    hosts: Arc<RwLock<HashMap<String, HostPacing>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            hosts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn host_of(url: &str) -> Option<String> {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }

    /// Reserve the next send slot for `url`'s host and sleep until it.
    ///
    /// The slot is claimed before sleeping, so concurrent callers for one
    /// host are spaced out rather than released together. Returns the host,
    /// or `None` for URLs without one (which are not paced).
    pub async fn wait_turn(&self, url: &str) -> Option<String> {
        let host = Self::host_of(url)?;

        let wait = {
            let mut hosts = self.hosts.write().await;
            let pacing = hosts
                .entry(host.clone())
                .or_insert_with(|| HostPacing::new(self.config.base_gap));
            let now = Instant::now();
            let wait = pacing.wait_at(now);
            pacing.last_sent = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            debug!("Pacing {}: waiting {:?}", host, wait);
            tokio::time::sleep(wait).await;
        }
        Some(host)
    }

    /// Adjust the host's gap for a response status.
    pub async fn record(&self, host: &str, status: u16) {
        let mut hosts = self.hosts.write().await;
        let Some(pacing) = hosts.get_mut(host) else {
            return;
        };

        match ResponseClass::from_status(status) {
            ResponseClass::Throttled => {
                pacing.streak = 0;
                pacing.backing_off = true;
                pacing.scale(self.config.throttle_factor, &self.config);
                warn!(
                    "{} throttled us (HTTP {}), gap now {:?}",
                    host, status, pacing.gap
                );
            }
            ResponseClass::ServerError => {
                pacing.streak = 0;
                pacing.backing_off = true;
                pacing.scale(self.config.server_error_factor, &self.config);
                debug!("{} returned HTTP {}, gap now {:?}", host, status, pacing.gap);
            }
            ResponseClass::Success if pacing.backing_off => {
                pacing.streak += 1;
                if pacing.streak < self.config.recovery_streak {
                    return;
                }
                pacing.streak = 0;
                pacing.scale(self.config.recovery_factor, &self.config);
                if pacing.gap <= self.config.base_gap {
                    pacing.gap = self.config.base_gap;
                    pacing.backing_off = false;
                    info!("{} recovered from backoff", host);
                }
            }
            ResponseClass::Success | ResponseClass::Neutral => {}
        }
    }

    /// How long a request to `url` would wait right now.
    pub async fn time_until_ready(&self, url: &str) -> Duration {
        let Some(host) = Self::host_of(url) else {
            return Duration::ZERO;
        };
        let hosts = self.hosts.read().await;
        hosts
            .get(&host)
            .map(|p| p.wait_at(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Current gap for a host that has been contacted.
    pub async fn current_gap(&self, host: &str) -> Option<Duration> {
        self.hosts.read().await.get(host).map(|p| p.gap)
    }
}
