//! Ranking by effective unit price.

use std::cmp::Ordering;

use crate::models::Product;

/// Order two products by the cheapest per-unit price each one offers.
///
/// A discounted product competes on its discounted per-unit price, so a
/// promotion can rank below a regular price from another seller.
pub fn compare_unit_price(a: &Product, b: &Product) -> Ordering {
    let key_a = a.effective_unit_price();
    let key_b = b.effective_unit_price();
    key_a.total_cmp(&key_b)
}

/// Stable sort, cheapest effective unit price first. Products with equal
/// keys keep their input order.
pub fn rank(mut products: Vec<Product>) -> Vec<Product> {
    products.sort_by(compare_unit_price);
    products
}
