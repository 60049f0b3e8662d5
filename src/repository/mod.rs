//! Repository layer for the search cache.
//!
//! All database access uses Diesel ORM on SQLite.

pub mod baskets;
pub mod context;
pub mod models;
pub mod pool;
pub mod products;
pub mod searches;
pub mod util;

pub use baskets::{BasketError, BasketRepository};
pub use context::DbContext;
pub use pool::{DbError, SqlitePool};
pub use products::ProductRepository;
pub use searches::{SearchCache, SearchUnitOfWork};
pub use util::parse_datetime;
