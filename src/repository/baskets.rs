//! Per-client basket repository.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use thiserror::Error;

use super::models::{BasketRecord, NewBasketItem, ProductRecord};
use super::pool::{DbError, SqlitePool};
use super::products::product_exists;
use super::util::parse_datetime;
use crate::models::{BasketItem, Product};
use crate::schema::{baskets, products};

#[derive(Debug, Error)]
pub enum BasketError {
    #[error("product {0} is not stored")]
    UnknownProduct(i64),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Basket repository.
#[derive(Clone)]
pub struct BasketRepository {
    pool: SqlitePool,
}

impl BasketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a stored product to a client's basket.
    ///
    /// Returns false when the product was already in the basket.
    pub async fn add(&self, client_id: &str, product_id: i64) -> Result<bool, BasketError> {
        let mut conn = self.pool.get().await?;

        conn.transaction(|conn| {
            Box::pin(async move {
                if !product_exists(conn, product_id).await? {
                    return Err(BasketError::UnknownProduct(product_id));
                }

                let rows = diesel::insert_or_ignore_into(baskets::table)
                    .values(NewBasketItem {
                        client_id,
                        product_id,
                        added_at: Utc::now().to_rfc3339(),
                    })
                    .execute(conn)
                    .await?;

                Ok(rows > 0)
            })
        })
        .await
    }

    /// List a client's basket, oldest first.
    pub async fn list(&self, client_id: &str) -> Result<Vec<BasketItem>, DbError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(BasketRecord, ProductRecord)> = baskets::table
            .inner_join(products::table)
            .filter(baskets::client_id.eq(client_id))
            .order((baskets::added_at.asc(), baskets::product_id.asc()))
            .select((BasketRecord::as_select(), ProductRecord::as_select()))
            .load(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(basket, product)| BasketItem {
                client_id: basket.client_id,
                added_at: parse_datetime(&basket.added_at),
                product: Product::from(product),
            })
            .collect())
    }

    /// Remove a product from a client's basket.
    pub async fn remove(&self, client_id: &str, product_id: i64) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::delete(
            baskets::table
                .filter(baskets::client_id.eq(client_id))
                .filter(baskets::product_id.eq(product_id)),
        )
        .execute(&mut conn)
        .await?;

        Ok(rows > 0)
    }
}
