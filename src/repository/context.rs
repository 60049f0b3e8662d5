//! Database context for managing the connection pool and repository access.

use std::path::Path;

use diesel_async::{RunQueryDsl, SimpleAsyncConnection};

use super::baskets::BasketRepository;
use super::pool::{DbError, SqlitePool};
use super::products::ProductRepository;
use super::searches::SearchCache;

/// Database context that owns the pool and hands out repositories.
///
/// Create one context per command or server, then use it to access all
/// repositories.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::new(&db_path);
/// ctx.init_schema().await?;
/// let cached = ctx.searches().lookup("milk").await?;
/// ```
#[derive(Debug, Clone)]
pub struct DbContext {
    pool: SqlitePool,
}

impl DbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: SqlitePool::from_path(db_path),
        }
    }

    /// Create a new database context from a database URL
    /// (`sqlite:path/to/db.sqlite` or a plain file path).
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: SqlitePool::new(database_url),
        }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Get the search cache.
    pub fn searches(&self) -> SearchCache {
        SearchCache::new(self.pool.clone())
    }

    /// Get a basket repository.
    pub fn baskets(&self) -> BasketRepository {
        BasketRepository::new(self.pool.clone())
    }

    /// Create the cache tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;

        conn.batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                seller TEXT NOT NULL,
                name TEXT NOT NULL,
                currency TEXT NOT NULL DEFAULT '',
                price REAL NOT NULL DEFAULT 0,
                price_per_unit REAL NOT NULL DEFAULT 0,
                discount_price REAL NOT NULL DEFAULT 0,
                discount_price_per_unit REAL NOT NULL DEFAULT 0,
                discount_price_in_words TEXT NOT NULL DEFAULT '',
                unit_type TEXT NOT NULL DEFAULT 'unknown',
                url TEXT NOT NULL,
                image_url TEXT NOT NULL DEFAULT '',
                UNIQUE(seller, url)
            );

            CREATE TABLE IF NOT EXISTS searches (
                search_term TEXT PRIMARY KEY,
                fetch_count INTEGER NOT NULL DEFAULT 1,
                last_fetch TEXT NOT NULL,
                expiry TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS search_products (
                search_term TEXT NOT NULL,
                generation INTEGER NOT NULL,
                position INTEGER NOT NULL,
                product_id INTEGER NOT NULL,
                PRIMARY KEY (search_term, generation, position),
                FOREIGN KEY (product_id) REFERENCES products(id)
            );

            CREATE TABLE IF NOT EXISTS baskets (
                client_id TEXT NOT NULL,
                product_id INTEGER NOT NULL,
                added_at TEXT NOT NULL,
                PRIMARY KEY (client_id, product_id),
                FOREIGN KEY (product_id) REFERENCES products(id)
            );

            CREATE INDEX IF NOT EXISTS idx_search_products_term
                ON search_products(search_term, generation);
            "#,
        )
        .await
    }

    /// Get list of all tables in the database.
    pub async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<TableName> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .load(&mut conn)
        .await?;

        Ok(rows.into_iter().map(|r| r.name).collect())
    }
}

#[derive(diesel::QueryableByName)]
struct TableName {
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}
