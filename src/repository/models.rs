//! Diesel records for the cache tables.

use diesel::prelude::*;

use super::util::parse_datetime;
use crate::models::{Product, SearchCacheEntry};
use crate::schema;

/// Product row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::products)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProductRecord {
    pub id: i64,
    pub seller: String,
    pub name: String,
    pub currency: String,
    pub price: f64,
    pub price_per_unit: f64,
    pub discount_price: f64,
    pub discount_price_per_unit: f64,
    pub discount_price_in_words: String,
    pub unit_type: String,
    pub url: String,
    pub image_url: String,
}

/// Product values for insertion, or for refreshing an existing row.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = schema::products)]
pub struct NewProduct<'a> {
    pub seller: &'a str,
    pub name: &'a str,
    pub currency: &'a str,
    pub price: f64,
    pub price_per_unit: f64,
    pub discount_price: f64,
    pub discount_price_per_unit: f64,
    pub discount_price_in_words: &'a str,
    pub unit_type: &'a str,
    pub url: &'a str,
    pub image_url: &'a str,
}

/// Search cache row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::searches)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SearchRecord {
    pub search_term: String,
    pub fetch_count: i32,
    pub last_fetch: String,
    pub expiry: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::searches)]
pub struct NewSearch<'a> {
    pub search_term: &'a str,
    pub fetch_count: i32,
    pub last_fetch: String,
    pub expiry: String,
}

/// Association between a search generation and one ranked product.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::search_products)]
pub struct NewSearchProduct<'a> {
    pub search_term: &'a str,
    pub generation: i32,
    pub position: i32,
    pub product_id: i64,
}

/// Basket row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::baskets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BasketRecord {
    pub client_id: String,
    pub product_id: i64,
    pub added_at: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = schema::baskets)]
pub struct NewBasketItem<'a> {
    pub client_id: &'a str,
    pub product_id: i64,
    pub added_at: String,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Product {
            id: Some(record.id),
            seller: record.seller,
            name: record.name,
            currency: record.currency,
            price: record.price,
            price_per_unit: record.price_per_unit,
            discount_price: record.discount_price,
            discount_price_per_unit: record.discount_price_per_unit,
            discount_price_in_words: record.discount_price_in_words,
            unit_type: record.unit_type.parse().unwrap_or_default(),
            url: record.url,
            image_url: record.image_url,
        }
    }
}

impl<'a> From<&'a Product> for NewProduct<'a> {
    fn from(product: &'a Product) -> Self {
        NewProduct {
            seller: &product.seller,
            name: &product.name,
            currency: &product.currency,
            price: product.price,
            price_per_unit: product.price_per_unit,
            discount_price: product.discount_price,
            discount_price_per_unit: product.discount_price_per_unit,
            discount_price_in_words: &product.discount_price_in_words,
            unit_type: product.unit_type.as_str(),
            url: &product.url,
            image_url: &product.image_url,
        }
    }
}

impl From<SearchRecord> for SearchCacheEntry {
    fn from(record: SearchRecord) -> Self {
        SearchCacheEntry {
            search_term: record.search_term,
            fetch_count: record.fetch_count,
            last_fetch: parse_datetime(&record.last_fetch),
            expiry: parse_datetime(&record.expiry),
        }
    }
}

impl<'a> From<&'a SearchCacheEntry> for NewSearch<'a> {
    fn from(entry: &'a SearchCacheEntry) -> Self {
        NewSearch {
            search_term: &entry.search_term,
            fetch_count: entry.fetch_count,
            last_fetch: entry.last_fetch.to_rfc3339(),
            expiry: entry.expiry.to_rfc3339(),
        }
    }
}
