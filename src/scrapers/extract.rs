//! Listing extraction.
//!
//! Applies a seller's compiled rules to a parsed search result page and
//! yields one `Product` per listing that carries every mandatory field.
//! Listings missing a name, link, price or per-unit price are skipped with a
//! debug log; nothing here fails the page as a whole.

use scraper::{ElementRef, Html};
use thiserror::Error;
use tracing::debug;

use crate::models::Product;
use crate::normalize::{parse_price, parse_price_per_unit, PriceError};
use crate::sellers::{CompiledDiscount, CompiledField, SellerRules};

/// Why a single listing was skipped.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("no {0} found")]
    Missing(&'static str),
    #[error("unparseable {field}: {source}")]
    Unparseable {
        field: &'static str,
        #[source]
        source: PriceError,
    },
}

/// Resolve a path to a full URL, handling both absolute and relative paths.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}{}", base_url, path)
    }
}

/// Lazy iterator over the products on one page, in document order.
pub struct Listings<'a> {
    rules: &'a SellerRules,
    nodes: scraper::html::Select<'a, 'a>,
    index: usize,
}

impl<'a> Iterator for Listings<'a> {
    type Item = Product;

    fn next(&mut self) -> Option<Product> {
        loop {
            let node = self.nodes.next()?;
            let index = self.index;
            self.index += 1;

            match extract_listing(node, self.rules) {
                Ok(product) => return Some(product),
                Err(reason) => {
                    debug!("{} listing {}: skipped, {}", self.rules.id(), index, reason);
                }
            }
        }
    }
}

/// Extract products from an already parsed document.
pub fn extract_products<'a>(document: &'a Html, rules: &'a SellerRules) -> Listings<'a> {
    Listings {
        rules,
        nodes: document.select(&rules.listing),
        index: 0,
    }
}

/// Parse `body` and collect its products.
///
/// `Html` is not `Send`, so callers on async tasks use this to keep the
/// parsed document confined to one synchronous scope.
pub fn extract_from_html(body: &str, rules: &SellerRules) -> Vec<Product> {
    let document = Html::parse_document(body);
    extract_products(&document, rules).collect()
}

/// Element text with whitespace runs collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_all(text: &str, strip: &[String]) -> String {
    let mut stripped = text.to_string();
    for s in strip {
        stripped = stripped.replace(s.as_str(), "");
    }
    stripped.trim().to_string()
}

/// Read a field from the first matching element under `node`.
fn read_field(node: ElementRef<'_>, field: &CompiledField) -> Option<String> {
    let element = node.select(&field.selector).next()?;
    let raw = match &field.attribute {
        Some(attr) => element.value().attr(attr)?.to_string(),
        None => element_text(element),
    };
    let value = strip_all(&raw, &field.strip);
    (!value.is_empty()).then_some(value)
}

fn discount_text(node: ElementRef<'_>, discount: &CompiledDiscount) -> Option<String> {
    let element = node.select(&discount.selector).next()?;
    let text = element_text(element);
    (!text.is_empty()).then_some(text)
}

/// Explicit discount price, after deny and allow filtering.
fn read_discount_price(text: &str, discount: &CompiledDiscount) -> Option<f64> {
    if discount.deny.iter().any(|re| re.is_match(text)) {
        return None;
    }

    let candidate = match &discount.allow {
        Some(allow) => allow.captures(text)?.get(1)?.as_str().to_string(),
        None => text.to_string(),
    };

    let candidate = strip_all(&candidate, &discount.strip);
    match parse_price(&candidate) {
        Ok(parsed) => Some(parsed.amount),
        Err(e) => {
            debug!("Ignoring discount {:?}: {}", text, e);
            None
        }
    }
}

fn read_discount_words(text: &str, discount: &CompiledDiscount) -> String {
    discount
        .words
        .as_ref()
        .and_then(|re| re.find(text))
        .map(|m| strip_all(m.as_str(), &discount.words_strip))
        .unwrap_or_default()
}

/// Build one product from a listing node.
pub fn extract_listing(node: ElementRef<'_>, rules: &SellerRules) -> Result<Product, ListingError> {
    let name = read_field(node, &rules.product_name).ok_or(ListingError::Missing("name"))?;

    let link = read_field(node, &rules.link).ok_or(ListingError::Missing("link"))?;
    let url = match &rules.descriptor.link_prefix {
        Some(prefix) => resolve_url(prefix, &link),
        None => link,
    };

    let price_text = read_field(node, &rules.price).ok_or(ListingError::Missing("price"))?;
    let parsed = parse_price(&price_text).map_err(|source| ListingError::Unparseable {
        field: "price",
        source,
    })?;
    let mut price = parsed.amount;
    let mut discount_price = 0.0;

    // Sites show the promotional price as the main price and the original
    // alongside it, so a was-price means the main price is the discount.
    let was_price = rules
        .was_price
        .as_ref()
        .and_then(|field| read_field(node, field))
        .and_then(|text| match parse_price(&text) {
            Ok(parsed) => Some(parsed.amount),
            Err(e) => {
                debug!("{}: ignoring was price {:?}: {}", url, text, e);
                None
            }
        })
        .unwrap_or(0.0);
    let swapped = was_price != 0.0;
    if swapped {
        discount_price = price;
        price = was_price;
    }

    let promo = rules
        .discount
        .as_ref()
        .and_then(|discount| discount_text(node, discount).map(|text| (discount, text)));

    if !swapped {
        if let Some((discount, text)) = &promo {
            discount_price = read_discount_price(text, discount).unwrap_or(0.0);
        }
    }

    let unit_text = read_field(node, &rules.price_per_unit)
        .ok_or(ListingError::Missing("price per unit"))?;
    let per_unit = parse_price_per_unit(&unit_text).map_err(|source| {
        ListingError::Unparseable {
            field: "price per unit",
            source,
        }
    })?;

    let discount_price_per_unit = if discount_price > 0.0 && price > 0.0 {
        (discount_price / price) * per_unit.amount
    } else {
        0.0
    };

    let discount_price_in_words = promo
        .map(|(discount, text)| read_discount_words(&text, discount))
        .unwrap_or_default();

    let image_url = rules
        .image
        .as_ref()
        .and_then(|field| read_field(node, field))
        .and_then(|srcset| srcset.split_whitespace().next().map(str::to_string))
        .unwrap_or_default();
    if image_url.is_empty() {
        debug!("{}: no image found", url);
    }

    Ok(Product {
        id: None,
        seller: rules.id().to_string(),
        name,
        currency: parsed.currency,
        price,
        price_per_unit: per_unit.amount,
        discount_price,
        discount_price_per_unit,
        discount_price_in_words,
        unit_type: per_unit.unit_type,
        url,
        image_url,
    })
}
