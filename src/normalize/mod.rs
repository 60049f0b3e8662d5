//! Price and unit normalization.
//!
//! Sellers print prices as loose strings ("€3.50", "€43 per 70cl",
//! "€9.68/l"). This module turns them into a currency plus a numeric amount,
//! and turns per-unit strings into a price per canonical unit so listings
//! from different sellers can be compared directly.

mod price;
mod unit;

pub use price::{
    parse_price, parse_price_per_unit, ParsedPrice, ParsedUnitPrice, PriceError, CURRENCY_SYMBOLS,
};
pub use unit::{MeasureUnit, UnitType};
