//! Compiled seller rules.
//!
//! Selectors and patterns are parsed once when the seller set is loaded so a
//! broken descriptor fails at startup rather than on every search.

use regex::Regex;
use scraper::Selector;
use thiserror::Error;

use super::descriptor::{DiscountRule, FieldRule, SellerDescriptor, QUERY_PLACEHOLDER};

/// A descriptor that could not be compiled.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("seller {seller}: invalid selector for {field} ({selector:?}): {message}")]
    InvalidSelector {
        seller: String,
        field: &'static str,
        selector: String,
        message: String,
    },
    #[error("seller {seller}: invalid pattern for {field}: {source}")]
    InvalidPattern {
        seller: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },
    #[error("seller {0}: search_path has no {{query}} placeholder")]
    MissingQueryPlaceholder(String),
    #[error("seller {0}: descriptor has no id")]
    MissingId(String),
    #[error("unknown seller: {0}")]
    UnknownSeller(String),
}

fn selector(seller: &str, field: &'static str, css: &str) -> Result<Selector, DescriptorError> {
    Selector::parse(css).map_err(|e| DescriptorError::InvalidSelector {
        seller: seller.to_string(),
        field,
        selector: css.to_string(),
        message: e.to_string(),
    })
}

fn pattern(seller: &str, field: &'static str, re: &str) -> Result<Regex, DescriptorError> {
    Regex::new(re).map_err(|source| DescriptorError::InvalidPattern {
        seller: seller.to_string(),
        field,
        source,
    })
}

/// A field rule with its selector parsed.
#[derive(Debug, Clone)]
pub struct CompiledField {
    pub selector: Selector,
    pub attribute: Option<String>,
    pub strip: Vec<String>,
}

impl CompiledField {
    fn compile(seller: &str, field: &'static str, rule: &FieldRule) -> Result<Self, DescriptorError> {
        Ok(Self {
            selector: selector(seller, field, &rule.selector)?,
            attribute: rule.attribute.clone(),
            strip: rule.strip.clone(),
        })
    }
}

/// A discount rule with its selector and patterns parsed.
#[derive(Debug, Clone)]
pub struct CompiledDiscount {
    pub selector: Selector,
    pub strip: Vec<String>,
    pub allow: Option<Regex>,
    pub deny: Vec<Regex>,
    pub words: Option<Regex>,
    pub words_strip: Vec<String>,
}

impl CompiledDiscount {
    fn compile(seller: &str, rule: &DiscountRule) -> Result<Self, DescriptorError> {
        Ok(Self {
            selector: selector(seller, "discount", &rule.selector)?,
            strip: rule.strip.clone(),
            allow: rule
                .allow
                .as_deref()
                .map(|re| pattern(seller, "discount.allow", re))
                .transpose()?,
            deny: rule
                .deny
                .iter()
                .map(|re| pattern(seller, "discount.deny", re))
                .collect::<Result<_, _>>()?,
            words: rule
                .words
                .as_deref()
                .map(|re| pattern(seller, "discount.words", re))
                .transpose()?,
            words_strip: rule.words_strip.clone(),
        })
    }
}

/// Ready-to-run extraction rules for one seller.
#[derive(Debug, Clone)]
pub struct SellerRules {
    pub descriptor: SellerDescriptor,
    pub listing: Selector,
    pub product_name: CompiledField,
    pub price: CompiledField,
    pub price_per_unit: CompiledField,
    pub was_price: Option<CompiledField>,
    pub discount: Option<CompiledDiscount>,
    pub link: CompiledField,
    pub image: Option<CompiledField>,
}

impl SellerRules {
    /// Parse every selector and pattern in `descriptor`.
    pub fn compile(descriptor: SellerDescriptor) -> Result<Self, DescriptorError> {
        let seller = descriptor.id.clone();
        if seller.is_empty() {
            return Err(DescriptorError::MissingId(descriptor.name));
        }
        if !descriptor.search_path.contains(QUERY_PLACEHOLDER) {
            return Err(DescriptorError::MissingQueryPlaceholder(seller));
        }

        let mut link = CompiledField::compile(&seller, "link", &descriptor.link)?;
        link.attribute = Some(descriptor.link_attribute().to_string());

        Ok(Self {
            listing: selector(&seller, "listing", &descriptor.listing)?,
            product_name: CompiledField::compile(&seller, "product_name", &descriptor.product_name)?,
            price: CompiledField::compile(&seller, "price", &descriptor.price)?,
            price_per_unit: CompiledField::compile(
                &seller,
                "price_per_unit",
                &descriptor.price_per_unit,
            )?,
            was_price: descriptor
                .was_price
                .as_ref()
                .map(|rule| CompiledField::compile(&seller, "was_price", rule))
                .transpose()?,
            discount: descriptor
                .discount
                .as_ref()
                .map(|rule| CompiledDiscount::compile(&seller, rule))
                .transpose()?,
            link,
            image: descriptor
                .image
                .as_ref()
                .map(|rule| CompiledField::compile(&seller, "image", rule))
                .transpose()?,
            descriptor,
        })
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Full search URL for `term`, with the term percent-encoded.
    pub fn search_url(&self, term: &str) -> String {
        let encoded = urlencoding::encode(term);
        format!(
            "{}{}",
            self.descriptor.base_url,
            self.descriptor
                .search_path
                .replace(QUERY_PLACEHOLDER, &encoded)
        )
    }
}
