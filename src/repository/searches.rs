//! Search cache repository.
//!
//! Each completed fetch of a search term writes a new generation of
//! `search_products` rows. Older generations are superseded, not deleted;
//! lookups only read the generation matching the entry's `fetch_count`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use super::models::{NewSearch, NewSearchProduct, ProductRecord, SearchRecord};
use super::pool::{DbError, SqliteConn, SqlitePool};
use super::products::upsert_product;
use crate::models::{CachedSearch, Product, SearchCacheEntry};
use crate::schema::{products, search_products, searches};

/// Everything one search writes to the cache, applied atomically.
#[derive(Debug, Clone)]
pub struct SearchUnitOfWork {
    /// Normalized search term (the cache key).
    pub search_term: String,
    /// Ranked products from the fetch, in display order.
    pub products: Vec<Product>,
    pub fetched_at: DateTime<Utc>,
    pub ttl_days: u64,
}

/// Search cache repository.
#[derive(Clone)]
pub struct SearchCache {
    pool: SqlitePool,
}

impl SearchCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the cache entry and latest products for a term.
    pub async fn lookup(&self, search_term: &str) -> Result<Option<CachedSearch>, DbError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| Box::pin(async move { load_cached(conn, search_term).await }))
            .await
    }

    /// Get only the cache bookkeeping for a term.
    pub async fn entry(&self, search_term: &str) -> Result<Option<SearchCacheEntry>, DbError> {
        let mut conn = self.pool.get().await?;
        load_entry(&mut conn, search_term).await
    }

    /// Whether the stored entry for `search_term` is stale at `now`.
    ///
    /// A term that was never fetched counts as expired.
    pub async fn is_expired_at(
        &self,
        search_term: &str,
        now: DateTime<Utc>,
        ttl_days: u64,
    ) -> Result<bool, DbError> {
        Ok(self
            .entry(search_term)
            .await?
            .map_or(true, |entry| entry.is_expired_at(now, ttl_days)))
    }

    /// Count cached search terms.
    pub async fn count(&self) -> Result<i64, DbError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        searches::table.select(count_star()).first(&mut conn).await
    }

    /// Store the products of a fetch and record the search, in one transaction.
    ///
    /// Products are deduplicated by `(seller, url)` and receive their stored
    /// ids. The entry is created on the first fetch and refreshed afterwards.
    pub async fn commit(&self, work: SearchUnitOfWork) -> Result<CachedSearch, DbError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(move |conn| {
            Box::pin(async move {
                let SearchUnitOfWork {
                    search_term,
                    mut products,
                    fetched_at,
                    ttl_days,
                } = work;

                let entry = match load_entry(conn, &search_term).await? {
                    Some(previous) => previous.refreshed(fetched_at, ttl_days),
                    None => SearchCacheEntry::new(search_term, fetched_at, ttl_days),
                };

                for product in products.iter_mut() {
                    upsert_product(conn, product).await?;
                }

                diesel::replace_into(searches::table)
                    .values(NewSearch::from(&entry))
                    .execute(conn)
                    .await?;

                for (position, product) in products.iter().enumerate() {
                    let Some(product_id) = product.id else {
                        continue;
                    };
                    diesel::insert_into(search_products::table)
                        .values(NewSearchProduct {
                            search_term: &entry.search_term,
                            generation: entry.fetch_count,
                            position: position as i32,
                            product_id,
                        })
                        .execute(conn)
                        .await?;
                }

                debug!(
                    "Recorded search '{}' generation {} with {} products",
                    entry.search_term,
                    entry.fetch_count,
                    products.len()
                );

                Ok(CachedSearch { entry, products })
            })
        })
        .await
    }
}

async fn load_entry(
    conn: &mut SqliteConn,
    search_term: &str,
) -> Result<Option<SearchCacheEntry>, DbError> {
    searches::table
        .find(search_term)
        .select(SearchRecord::as_select())
        .first(conn)
        .await
        .optional()
        .map(|opt| opt.map(SearchCacheEntry::from))
}

async fn load_cached(
    conn: &mut SqliteConn,
    search_term: &str,
) -> Result<Option<CachedSearch>, DbError> {
    let Some(entry) = load_entry(conn, search_term).await? else {
        return Ok(None);
    };

    let records: Vec<ProductRecord> = search_products::table
        .inner_join(products::table)
        .filter(search_products::search_term.eq(search_term))
        .filter(search_products::generation.eq(entry.fetch_count))
        .order(search_products::position.asc())
        .select(ProductRecord::as_select())
        .load(conn)
        .await?;

    Ok(Some(CachedSearch {
        entry,
        products: records.into_iter().map(Product::from).collect(),
    }))
}
