//! Product listing model.

use serde::{Deserialize, Serialize};

use crate::normalize::UnitType;

/// One product listing from one seller.
///
/// `price_per_unit` and `discount_price_per_unit` are always expressed in
/// the same canonical `unit_type`, so listings compare across sellers.
/// A `discount_price` of zero means no discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned identifier, set once the product is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub seller: String,
    pub name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub price_per_unit: f64,
    #[serde(default)]
    pub discount_price: f64,
    #[serde(default)]
    pub discount_price_per_unit: f64,
    #[serde(default)]
    pub discount_price_in_words: String,
    #[serde(default)]
    pub unit_type: UnitType,
    pub url: String,
    #[serde(default, rename = "img_url")]
    pub image_url: String,
}

impl Product {
    /// Create an unpersisted product with no discount.
    pub fn new(seller: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            seller: seller.into(),
            name: name.into(),
            currency: String::new(),
            price: 0.0,
            price_per_unit: 0.0,
            discount_price: 0.0,
            discount_price_per_unit: 0.0,
            discount_price_in_words: String::new(),
            unit_type: UnitType::Unknown,
            url: url.into(),
            image_url: String::new(),
        }
    }

    pub fn has_discount(&self) -> bool {
        self.discount_price != 0.0
    }

    /// Cheapest per-unit price on offer: the discounted figure when there is
    /// one, otherwise the regular per-unit price.
    pub fn effective_unit_price(&self) -> f64 {
        if self.discount_price_per_unit != 0.0 {
            self.discount_price_per_unit
        } else {
            self.price_per_unit
        }
    }
}
