//! Currency and price string parsing.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::unit::{MeasureUnit, UnitType};

/// Currency symbols recognised in price strings, in lookup order.
pub const CURRENCY_SYMBOLS: [&str; 3] = ["€", "£", "$"];

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9.]+").unwrap());
static UNIT_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.\s]+").unwrap());

/// Why a price string could not be normalized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PriceError {
    #[error("no numeric amount in {0:?}")]
    NoNumber(String),
    #[error("{0:?} is not a valid number")]
    InvalidNumber(String),
    #[error("expected exactly one '/' or 'per' separator in {0:?}")]
    NoPerUnitSplit(String),
    #[error("unrecognised unit {0:?}")]
    UnknownUnit(String),
    #[error("zero quantity in {0:?}")]
    ZeroQuantity(String),
}

/// A plain price such as `"€3.50"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrice {
    /// Currency symbol found in the text, empty if none.
    pub currency: String,
    pub amount: f64,
}

/// A price per canonical unit, e.g. `"€43 per 70cl"` as 61.43 per litre.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUnitPrice {
    pub currency: String,
    pub amount: f64,
    pub unit_type: UnitType,
}

/// Split the currency symbol off a price string.
fn split_currency(text: &str) -> (String, String) {
    let currency = CURRENCY_SYMBOLS
        .iter()
        .find(|symbol| text.contains(*symbol))
        .map(|symbol| symbol.to_string())
        .unwrap_or_default();

    let mut stripped = text.to_string();
    for symbol in CURRENCY_SYMBOLS {
        stripped = stripped.replace(symbol, "");
    }
    (currency, stripped)
}

fn to_float(text: &str) -> Result<f64, PriceError> {
    text.parse::<f64>()
        .map_err(|_| PriceError::InvalidNumber(text.to_string()))
}

/// Parse a plain price string into currency and amount.
///
/// Whitespace anywhere in the string is ignored, so `"€ 1 234.50"` style
/// output from some layouts still parses.
pub fn parse_price(text: &str) -> Result<ParsedPrice, PriceError> {
    let (currency, stripped) = split_currency(text);
    let compact: String = stripped.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.is_empty() {
        return Err(PriceError::NoNumber(text.to_string()));
    }

    Ok(ParsedPrice {
        currency,
        amount: to_float(&compact)?,
    })
}

/// Parse an "amount per quantity unit" string into a price per canonical unit.
///
/// The text is split on `/` if present, otherwise on `per`. The left side
/// supplies the amount; the right side supplies an optional quantity
/// (default 1) and a unit token.
pub fn parse_price_per_unit(text: &str) -> Result<ParsedUnitPrice, PriceError> {
    let (currency, stripped) = split_currency(text);

    let segments: Vec<&str> = if stripped.contains('/') {
        stripped.split('/').collect()
    } else if stripped.contains("per") {
        stripped.split("per").collect()
    } else {
        Vec::new()
    };

    let [price_part, unit_part] = segments.as_slice() else {
        return Err(PriceError::NoPerUnitSplit(text.to_string()));
    };

    let amount = NUMERIC
        .find(price_part)
        .ok_or_else(|| PriceError::NoNumber(text.to_string()))?;
    let amount = to_float(amount.as_str())?;

    let quantity = match NUMERIC.find(unit_part) {
        Some(m) => to_float(m.as_str())?,
        None => 1.0,
    };
    if quantity == 0.0 {
        return Err(PriceError::ZeroQuantity(text.to_string()));
    }

    let token = UNIT_TOKEN
        .find(unit_part)
        .map(|m| m.as_str())
        .ok_or_else(|| PriceError::UnknownUnit(String::new()))?;

    let unit =
        MeasureUnit::classify(token).ok_or_else(|| PriceError::UnknownUnit(token.to_string()))?;

    let canonical = unit.canonicalize(amount, quantity);
    debug!(
        "Normalized {:?} to {} per {}",
        text,
        canonical,
        unit.unit_type()
    );

    Ok(ParsedUnitPrice {
        currency,
        amount: canonical,
        unit_type: unit.unit_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_parse_price_with_currency() {
        let parsed = parse_price("€3.50").unwrap();
        assert_eq!(parsed.currency, "€");
        assert_close(parsed.amount, 3.5);

        let parsed = parse_price("£ 12").unwrap();
        assert_eq!(parsed.currency, "£");
        assert_close(parsed.amount, 12.0);
    }

    #[test]
    fn test_parse_price_without_currency() {
        let parsed = parse_price("4.00").unwrap();
        assert_eq!(parsed.currency, "");
        assert_close(parsed.amount, 4.0);
    }

    #[test]
    fn test_parse_price_rejects_text() {
        assert!(matches!(
            parse_price("Clubcard Price"),
            Err(PriceError::InvalidNumber(_))
        ));
        assert!(matches!(parse_price("€"), Err(PriceError::NoNumber(_))));
    }

    #[test]
    fn test_per_unit_centilitres() {
        let parsed = parse_price_per_unit("€43 per 70cl").unwrap();
        assert_eq!(parsed.currency, "€");
        assert_eq!(parsed.unit_type, UnitType::Litre);
        assert_close(parsed.amount, 61.42857142857143);

        let parsed = parse_price_per_unit("€50 per 100cl").unwrap();
        assert_close(parsed.amount, 50.0);

        let parsed = parse_price_per_unit("€0.01/cl").unwrap();
        assert_close(parsed.amount, 1.0);
    }

    #[test]
    fn test_per_unit_weights() {
        let parsed = parse_price_per_unit("€5/kg").unwrap();
        assert_eq!(parsed.unit_type, UnitType::Kilogram);
        assert_close(parsed.amount, 5.0);

        let parsed = parse_price_per_unit("€2/g").unwrap();
        assert_eq!(parsed.unit_type, UnitType::Kilogram);
        assert_close(parsed.amount, 2000.0);

        let parsed = parse_price_per_unit("€1.20 per 100g").unwrap();
        assert_close(parsed.amount, 12.0);
    }

    #[test]
    fn test_per_unit_volumes() {
        let parsed = parse_price_per_unit("€9.68/l").unwrap();
        assert_eq!(parsed.unit_type, UnitType::Litre);
        assert_close(parsed.amount, 9.68);

        assert_close(parse_price_per_unit("€3/litre").unwrap().amount, 3.0);
        assert_close(parse_price_per_unit("€3/ml").unwrap().amount, 3000.0);
    }

    #[test]
    fn test_per_unit_each() {
        let parsed = parse_price_per_unit("€2/item").unwrap();
        assert_eq!(parsed.unit_type, UnitType::Each);
        assert_close(parsed.amount, 2.0);

        assert_close(parse_price_per_unit("€0.50 per 6 units").unwrap().amount, 3.0);
    }

    #[test]
    fn test_canonical_input_is_stable() {
        let once = parse_price_per_unit("€2/g").unwrap();
        let again = parse_price_per_unit(&format!("€{}/kg", once.amount)).unwrap();
        assert_close(again.amount, once.amount);
    }

    #[test]
    fn test_per_unit_requires_separator() {
        assert!(matches!(
            parse_price_per_unit("€5"),
            Err(PriceError::NoPerUnitSplit(_))
        ));
        assert!(matches!(
            parse_price_per_unit("€5.00"),
            Err(PriceError::NoPerUnitSplit(_))
        ));
        assert!(matches!(
            parse_price_per_unit("€5/kg/day"),
            Err(PriceError::NoPerUnitSplit(_))
        ));
    }

    #[test]
    fn test_per_unit_unknown_unit() {
        assert_eq!(
            parse_price_per_unit("€5/stone"),
            Err(PriceError::UnknownUnit("stone".to_string()))
        );
        assert!(matches!(
            parse_price_per_unit("€5/KG"),
            Err(PriceError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_per_unit_zero_quantity() {
        assert!(matches!(
            parse_price_per_unit("€5 per 0g"),
            Err(PriceError::ZeroQuantity(_))
        ));
    }
}
