//! Service layer for pricewise business logic.
//!
//! Services hold the search flow separately from UI concerns so the CLI
//! and the web server share it.

pub mod search;

pub use search::{normalize_search_term, ResultSource, SearchError, SearchOutcome, SearchService};
