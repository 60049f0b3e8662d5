//! Display currencies.
//!
//! Sellers price in euro. Results can be shown in another currency using a
//! fixed rate table; the table is also returned to API clients so they can
//! convert on their side.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::models::Product;

#[derive(Debug, Error, PartialEq)]
pub enum CurrencyError {
    #[error("unknown currency: {0}")]
    Unknown(String),
}

/// Euro exchange rate and display symbol for one currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrencyRate {
    pub rate: f64,
    pub symbol: &'static str,
}

struct CurrencyInfo {
    name: &'static str,
    code: &'static str,
    rate: CurrencyRate,
}

const fn currency(name: &'static str, code: &'static str, rate: f64, symbol: &'static str) -> CurrencyInfo {
    CurrencyInfo {
        name,
        code,
        rate: CurrencyRate { rate, symbol },
    }
}

static CURRENCIES: &[CurrencyInfo] = &[
    currency("Euro", "EUR", 1.0, "€"),
    currency("UK", "GBP", 0.86, "£"),
    currency("Canada", "CAD", 1.44, "C$"),
    currency("Australia", "AUD", 1.63, "A$"),
    currency("India", "INR", 89.42, "₹"),
    currency("Costa Rica", "CRC", 588.03, "₡"),
    currency("Poland", "PLN", 4.46, "zł"),
];

/// Rate table keyed by display name, as sent to API clients.
pub fn rate_table() -> BTreeMap<&'static str, CurrencyRate> {
    CURRENCIES.iter().map(|c| (c.name, c.rate)).collect()
}

/// Look up a currency by display name or ISO code, ignoring case.
pub fn find(name_or_code: &str) -> Result<CurrencyRate, CurrencyError> {
    let wanted = name_or_code.trim();
    CURRENCIES
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(wanted) || c.code.eq_ignore_ascii_case(wanted))
        .map(|c| c.rate)
        .ok_or_else(|| CurrencyError::Unknown(wanted.to_string()))
}

/// Rate of the currency displayed with `symbol`. An empty symbol is euro.
fn by_symbol(symbol: &str) -> Option<CurrencyRate> {
    if symbol.is_empty() {
        return find("EUR").ok();
    }
    CURRENCIES
        .iter()
        .find(|c| c.rate.symbol == symbol)
        .map(|c| c.rate)
}

/// Convert prices in place and relabel them with the target symbol.
///
/// Each product is converted from the currency its symbol names, through
/// euro. Products with a symbol outside the table keep their prices.
/// Discount wording is seller text and is left untouched.
pub fn convert(products: &mut [Product], name_or_code: &str) -> Result<CurrencyRate, CurrencyError> {
    let target = find(name_or_code)?;

    for product in products.iter_mut() {
        let Some(source) = by_symbol(&product.currency) else {
            warn!(
                "Not converting {} ({}): unknown currency symbol {:?}",
                product.name, product.seller, product.currency
            );
            continue;
        };
        let factor = target.rate / source.rate;
        product.price *= factor;
        product.price_per_unit *= factor;
        product.discount_price *= factor;
        product.discount_price_per_unit *= factor;
        product.currency = target.symbol.to_string();
    }

    Ok(target)
}
