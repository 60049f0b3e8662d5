//! Basket model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Product;

/// A product saved to a client's basket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketItem {
    pub client_id: String,
    pub added_at: DateTime<Utc>,
    pub product: Product,
}
