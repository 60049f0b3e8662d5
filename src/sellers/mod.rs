//! Seller descriptors.
//!
//! Each seller is described by data alone: CSS selectors for the listing
//! fields, substrings to strip from noisy text, and regex allow/deny lists
//! for promotional text. Adding a seller means adding a descriptor value.

mod builtin;
mod descriptor;
mod rules;

use std::collections::HashMap;
use std::sync::Arc;

pub use builtin::builtin_descriptors;
pub use descriptor::{DiscountRule, FieldRule, SellerDescriptor, QUERY_PLACEHOLDER};
pub use rules::{CompiledDiscount, CompiledField, DescriptorError, SellerRules};

/// Merge configured descriptors over the built-in set and compile them.
///
/// Descriptors in `overrides` replace built-ins with the same id, or add new
/// sellers. When `enabled` is non-empty only those ids are kept, in the
/// order given; otherwise built-ins come first followed by additions in id
/// order.
pub fn load_sellers(
    overrides: &HashMap<String, SellerDescriptor>,
    enabled: &[String],
) -> Result<Vec<Arc<SellerRules>>, DescriptorError> {
    let mut descriptors: Vec<SellerDescriptor> = builtin_descriptors()
        .into_iter()
        .map(|d| match overrides.get(&d.id) {
            Some(replacement) => {
                let mut replacement = replacement.clone();
                if replacement.id.is_empty() {
                    replacement.id = d.id;
                }
                replacement
            }
            None => d,
        })
        .collect();

    let mut additions: Vec<&String> = overrides
        .keys()
        .filter(|id| !descriptors.iter().any(|d| &d.id == *id))
        .collect();
    additions.sort();
    for id in additions {
        let mut descriptor = overrides[id].clone();
        if descriptor.id.is_empty() {
            descriptor.id = id.clone();
        }
        descriptors.push(descriptor);
    }

    if !enabled.is_empty() {
        let mut selected = Vec::with_capacity(enabled.len());
        for id in enabled {
            match descriptors.iter().position(|d| &d.id == id) {
                Some(idx) => selected.push(descriptors.swap_remove(idx)),
                None => return Err(DescriptorError::UnknownSeller(id.clone())),
            }
        }
        descriptors = selected;
    }

    descriptors
        .into_iter()
        .map(|d| SellerRules::compile(d).map(Arc::new))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_builtin_sellers() {
        let sellers = load_sellers(&HashMap::new(), &[]).unwrap();
        let ids: Vec<&str> = sellers.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["tesco", "dunnes", "supervalu"]);
    }

    #[test]
    fn test_enabled_filter_keeps_order() {
        let enabled = vec!["supervalu".to_string(), "tesco".to_string()];
        let sellers = load_sellers(&HashMap::new(), &enabled).unwrap();
        let ids: Vec<&str> = sellers.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["supervalu", "tesco"]);
    }

    #[test]
    fn test_unknown_enabled_seller() {
        let enabled = vec!["aldi".to_string()];
        let err = load_sellers(&HashMap::new(), &enabled).unwrap_err();
        assert!(matches!(err, DescriptorError::UnknownSeller(id) if id == "aldi"));
    }

    #[test]
    fn test_override_and_addition() {
        let mut overrides = HashMap::new();
        let mut tesco = builtin_descriptors().remove(0);
        tesco.name = "Tesco Ireland".to_string();
        overrides.insert("tesco".to_string(), tesco);

        let mut extra = builtin_descriptors().remove(1);
        extra.id = String::new();
        extra.name = "Corner Shop".to_string();
        overrides.insert("corner".to_string(), extra);

        let sellers = load_sellers(&overrides, &[]).unwrap();
        assert_eq!(sellers.len(), 4);
        assert_eq!(sellers[0].name(), "Tesco Ireland");
        assert_eq!(sellers[3].id(), "corner");
    }
}
