//! Concurrent multi-seller fetch and merge.

mod orchestrator;
mod permits;

pub use orchestrator::{FetchOrchestrator, SellerOutcome, SellerReport, DEFAULT_SELLER_TIMEOUT};
pub use permits::{FetchPermit, FetchPermits};
