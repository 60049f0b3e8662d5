//! Search cache models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// 9999-12-31T23:59:59Z, the latest instant that survives an RFC 3339
/// round trip through the database.
pub const LATEST_EXPIRY_TIMESTAMP: i64 = 253_402_300_799;

/// Cache bookkeeping for one search term.
///
/// `expiry` is always `last_fetch` plus the TTL the entry was written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCacheEntry {
    /// Normalized (lower-cased, whitespace-collapsed) search term.
    pub search_term: String,
    pub fetch_count: i32,
    pub last_fetch: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

impl SearchCacheEntry {
    /// Create an entry for a first fetch at `now`.
    pub fn new(search_term: impl Into<String>, now: DateTime<Utc>, ttl_days: u64) -> Self {
        Self {
            search_term: search_term.into(),
            fetch_count: 1,
            last_fetch: now,
            expiry: expiry_from(now, ttl_days),
        }
    }

    /// Record another fetch at `now`, recomputing the expiry.
    pub fn refreshed(&self, now: DateTime<Utc>, ttl_days: u64) -> Self {
        Self {
            search_term: self.search_term.clone(),
            fetch_count: self.fetch_count + 1,
            last_fetch: now,
            expiry: expiry_from(now, ttl_days),
        }
    }

    /// Whether the entry is stale at `now` for the given TTL.
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl_days: u64) -> bool {
        now > expiry_from(self.last_fetch, ttl_days)
    }

    pub fn is_expired(&self, ttl_days: u64) -> bool {
        self.is_expired_at(Utc::now(), ttl_days)
    }
}

/// Latest expiry an entry can carry. TTLs reaching past it saturate here.
pub fn latest_expiry() -> DateTime<Utc> {
    DateTime::from_timestamp(LATEST_EXPIRY_TIMESTAMP, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn expiry_from(last_fetch: DateTime<Utc>, ttl_days: u64) -> DateTime<Utc> {
    i64::try_from(ttl_days)
        .ok()
        .and_then(|days| days.checked_mul(SECONDS_PER_DAY))
        .and_then(Duration::try_seconds)
        .and_then(|ttl| last_fetch.checked_add_signed(ttl))
        .map_or_else(latest_expiry, |expiry| expiry.min(latest_expiry()))
}

/// A cache entry together with the products of its latest fetch.
#[derive(Debug, Clone)]
pub struct CachedSearch {
    pub entry: SearchCacheEntry,
    pub products: Vec<Product>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundaries() {
        let t0 = Utc::now();
        let entry = SearchCacheEntry::new("milk", t0, 7);

        assert!(!entry.is_expired_at(t0 + Duration::days(6), 7));
        assert!(!entry.is_expired_at(t0 + Duration::days(7), 7));
        assert!(entry.is_expired_at(t0 + Duration::days(8), 7));
    }

    #[test]
    fn test_expiry_invariant() {
        let t0 = Utc::now();
        let entry = SearchCacheEntry::new("milk", t0, 7);
        assert_eq!(entry.expiry, t0 + Duration::days(7));
    }

    #[test]
    fn test_refresh_increments_fetch_count() {
        let t0 = Utc::now();
        let entry = SearchCacheEntry::new("milk", t0, 7);
        let later = t0 + Duration::days(9);
        let refreshed = entry.refreshed(later, 3);

        assert_eq!(refreshed.fetch_count, 2);
        assert_eq!(refreshed.last_fetch, later);
        assert_eq!(refreshed.expiry, later + Duration::days(3));
        assert!(!refreshed.is_expired_at(later + Duration::days(1), 3));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let t0 = Utc::now();
        for ttl in [100_000_000, i64::MAX as u64, u64::MAX] {
            let entry = SearchCacheEntry::new("milk", t0, ttl);
            assert_eq!(entry.expiry, latest_expiry());
            assert!(!entry.is_expired_at(t0 + Duration::days(365), ttl));
        }
    }

    #[test]
    fn test_latest_expiry_survives_rfc3339() {
        let stored = latest_expiry().to_rfc3339();
        let parsed = DateTime::parse_from_rfc3339(&stored).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), latest_expiry());
    }
}
