//! Data models for pricewise.

mod basket;
mod product;
mod search;

pub use basket::BasketItem;
pub use product::Product;
pub use search::{latest_expiry, CachedSearch, SearchCacheEntry, SECONDS_PER_DAY};

pub use crate::normalize::UnitType;
