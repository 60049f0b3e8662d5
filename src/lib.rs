//! pricewise - grocery price comparison across online supermarkets.
//!
//! Searches several sellers concurrently, normalizes their prices to a
//! common per-unit basis and ranks the listings cheapest first. Results are
//! cached in SQLite per search term, and a small HTTP API serves searches
//! and per-client baskets.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod currency;
pub mod models;
pub mod normalize;
pub mod ranking;
pub mod repository;
pub mod schema;
pub mod scrapers;
pub mod sellers;
pub mod server;
pub mod services;
