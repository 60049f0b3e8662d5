//! Product repository.
//!
//! A product row is identified by `(seller, url)`. Upserting a listing that
//! is already stored refreshes its prices and reuses the stored id, so each
//! seller URL is stored at most once.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewProduct, ProductRecord};
use super::pool::{DbError, SqliteConn, SqlitePool};
use super::util::last_insert_rowid;
use crate::models::Product;
use crate::schema::products;

/// Product repository.
#[derive(Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a product by id.
    pub async fn get(&self, id: i64) -> Result<Option<Product>, DbError> {
        let mut conn = self.pool.get().await?;

        products::table
            .find(id)
            .select(ProductRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Product::from))
    }

    /// Find the stored row for a seller URL.
    pub async fn find_by_url(&self, seller: &str, url: &str) -> Result<Option<Product>, DbError> {
        let mut conn = self.pool.get().await?;

        products::table
            .filter(products::seller.eq(seller))
            .filter(products::url.eq(url))
            .select(ProductRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Product::from))
    }

    /// Insert or refresh a product, writing the assigned id back into it.
    pub async fn upsert(&self, product: &mut Product) -> Result<i64, DbError> {
        let mut conn = self.pool.get().await?;
        upsert_product(&mut conn, product).await
    }

    /// Count stored products.
    pub async fn count(&self) -> Result<i64, DbError> {
        let mut conn = self.pool.get().await?;

        use diesel::dsl::count_star;
        products::table
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// Check if a product id exists.
    pub async fn exists(&self, id: i64) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;
        product_exists(&mut conn, id).await
    }
}

pub(crate) async fn product_exists(conn: &mut SqliteConn, id: i64) -> Result<bool, DbError> {
    use diesel::dsl::count_star;
    let count: i64 = products::table
        .filter(products::id.eq(id))
        .select(count_star())
        .first(conn)
        .await?;

    Ok(count > 0)
}

/// Upsert on an open connection so callers can run it inside a transaction.
pub(crate) async fn upsert_product(
    conn: &mut SqliteConn,
    product: &mut Product,
) -> Result<i64, DbError> {
    let existing: Option<i64> = products::table
        .filter(products::seller.eq(&product.seller))
        .filter(products::url.eq(&product.url))
        .select(products::id)
        .first(conn)
        .await
        .optional()?;

    let values = NewProduct::from(&*product);
    let id = match existing {
        Some(id) => {
            diesel::update(products::table.find(id))
                .set(&values)
                .execute(conn)
                .await?;
            id
        }
        None => {
            diesel::insert_into(products::table)
                .values(&values)
                .execute(conn)
                .await?;
            last_insert_rowid(conn).await?
        }
    };

    product.id = Some(id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitType;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup_test_db() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::new(&dir.path().join("test.db"));
        ctx.init_schema().await.unwrap();
        (ctx, dir)
    }

    fn milk(price: f64) -> Product {
        let mut product = Product::new("tesco", "Milk 2L", "https://www.tesco.ie/p/100");
        product.currency = "€".to_string();
        product.price = price;
        product.price_per_unit = price / 2.0;
        product.unit_type = UnitType::Litre;
        product
    }

    #[tokio::test]
    async fn test_upsert_assigns_id() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.products();

        let mut product = milk(2.40);
        let id = repo.upsert(&mut product).await.unwrap();
        assert_eq!(product.id, Some(id));

        let fetched = repo.get(id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Milk 2L");
        assert_eq!(fetched.unit_type, UnitType::Litre);
        assert_eq!(fetched.price_per_unit, 1.20);
    }

    #[tokio::test]
    async fn test_same_seller_url_stored_once() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.products();

        let mut first = milk(2.40);
        let mut second = milk(2.10);
        let first_id = repo.upsert(&mut first).await.unwrap();
        let second_id = repo.upsert(&mut second).await.unwrap();

        assert_eq!(first_id, second_id);
        assert_eq!(first.id, second.id);
        assert_eq!(repo.count().await.unwrap(), 1);

        // The reused row carries the latest prices.
        let stored = repo
            .find_by_url("tesco", "https://www.tesco.ie/p/100")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.price, 2.10);
    }

    #[tokio::test]
    async fn test_same_url_different_seller_is_distinct() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.products();

        let mut tesco = milk(2.40);
        let mut other = milk(2.40);
        other.seller = "dunnes".to_string();

        let a = repo.upsert(&mut tesco).await.unwrap();
        let b = repo.upsert(&mut other).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(repo.count().await.unwrap(), 2);
        assert!(repo.exists(a).await.unwrap());
        assert!(!repo.exists(a + b + 1).await.unwrap());
    }
}
