//! Declarative seller descriptor types.

use serde::{Deserialize, Serialize};

/// Placeholder in `search_path` replaced by the encoded search term.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// How to read one field from a listing node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// CSS selector, evaluated relative to the listing node.
    pub selector: String,
    /// Attribute to read. When unset the element's text is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    /// Substrings removed from the extracted value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strip: Vec<String>,
}

impl FieldRule {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(selector: &str, attribute: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attribute: Some(attribute.to_string()),
            strip: Vec::new(),
        }
    }

    pub fn stripping(mut self, strip: &[&str]) -> Self {
        self.strip = strip.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Promotional price block: an explicit discount price plus its wording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountRule {
    /// Selector of the node carrying the promotion.
    pub selector: String,
    /// Substrings removed from the price text before parsing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strip: Vec<String>,
    /// When set, the text must match and the first capture group becomes
    /// the price text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<String>,
    /// Any match voids the discount price.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,
    /// Pattern locating the human-readable offer ("Any 2 for €5").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<String>,
    /// Substrings removed from the offer wording.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words_strip: Vec<String>,
}

/// Extraction rules for one seller's search result page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerDescriptor {
    /// Stable identifier, stored on every product.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Site root, e.g. `https://www.tesco.ie`.
    pub base_url: String,
    /// Search path containing `{query}`.
    pub search_path: String,
    /// Selector matching one node per product listing.
    pub listing: String,
    pub product_name: FieldRule,
    pub price: FieldRule,
    pub price_per_unit: FieldRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_price: Option<FieldRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountRule>,
    pub link: FieldRule,
    /// Prepended to relative links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<FieldRule>,
}

impl SellerDescriptor {
    /// Attribute used for links, `href` unless configured.
    pub fn link_attribute(&self) -> &str {
        self.link.attribute.as_deref().unwrap_or("href")
    }
}
