//! Built-in descriptors for the supported Irish grocery sites.

use super::descriptor::{DiscountRule, FieldRule, SellerDescriptor};

/// Descriptors for every built-in seller, in fetch submission order.
pub fn builtin_descriptors() -> Vec<SellerDescriptor> {
    vec![tesco(), dunnes(), supervalu()]
}

fn tesco() -> SellerDescriptor {
    let base_url = "https://www.tesco.ie";
    SellerDescriptor {
        id: "tesco".to_string(),
        name: "Tesco".to_string(),
        base_url: base_url.to_string(),
        search_path: "/groceries/en-IE/search?query={query}&page=1&count=90".to_string(),
        listing: "ul.product-list > li".to_string(),
        product_name: FieldRule::text(r#"[data-auto="product-tile--title"]"#),
        price: FieldRule::text(".beans-price__text"),
        price_per_unit: FieldRule::text(".beans-price__subtext"),
        was_price: None,
        discount: Some(DiscountRule {
            selector: ".offer-text".to_string(),
            strip: vec!["Clubcard Price".to_string()],
            allow: Some(r"€?(\d+(\.\d+)?) Clubcard Price".to_string()),
            // Multi-buy totals are not a single-item price
            deny: vec![r"Any \d+ for".to_string()],
            words: Some(r"Any \d+ for €?(\d+(\.\d+)?) Clubcard Price".to_string()),
            words_strip: Vec::new(),
        }),
        link: FieldRule::attr("a", "href"),
        link_prefix: Some(base_url.to_string()),
        image: Some(FieldRule::attr("img", "srcset")),
    }
}

fn dunnes() -> SellerDescriptor {
    SellerDescriptor {
        id: "dunnes".to_string(),
        name: "Dunnes".to_string(),
        base_url: "https://www.dunnesstoresgrocery.com".to_string(),
        search_path: "/sm/delivery/rsid/258/results?q={query}&page=1&count=90".to_string(),
        listing: ".ColListing--1fk1zey".to_string(),
        product_name: FieldRule::text("[class^='ProductCardTitle--']"),
        price: FieldRule::text("[class^='ProductCardPrice--']"),
        price_per_unit: FieldRule::text("[class^='ProductCardPriceInfo--']"),
        was_price: Some(FieldRule::text("[class^='WasPrice--']")),
        discount: Some(DiscountRule {
            selector: r#"[data-testid="promotionBadgeComponent-testId"]"#.to_string(),
            words: Some(r"Buy \d+ for €?\d+(\.\d+)?".to_string()),
            ..Default::default()
        }),
        link: FieldRule::attr("article > a", "href"),
        link_prefix: None,
        image: Some(FieldRule::attr("img[class*=Image--]", "src")),
    }
}

fn supervalu() -> SellerDescriptor {
    SellerDescriptor {
        id: "supervalu".to_string(),
        name: "SuperValu".to_string(),
        base_url: "https://shop.supervalu.ie".to_string(),
        search_path: "/sm/delivery/rsid/5550/results?q={query}".to_string(),
        listing: "[class^='ColListing--']".to_string(),
        product_name: FieldRule::text("[class^='ProductCardTitle--']")
            .stripping(&["Open product description"]),
        price: FieldRule::text("[class^='ProductCardPrice--']"),
        price_per_unit: FieldRule::text("[class^='ProductCardPriceInfo--']"),
        was_price: Some(FieldRule::text("[class^='WasPrice--']").stripping(&["was"])),
        discount: Some(DiscountRule {
            selector: r#"[data-testid="promotionBadgeComponent-testId"]"#.to_string(),
            strip: vec!["ONLY".to_string(), "SAVE".to_string()],
            allow: None,
            deny: vec![r"\d+ for €?\d+(\.\d+)?".to_string()],
            words: Some(r"\d+ for €?\d+(\.\d+)?".to_string()),
            words_strip: vec!["ONLY".to_string(), "SAVE".to_string()],
        }),
        link: FieldRule::attr("article > a", "href"),
        link_prefix: None,
        image: Some(FieldRule::attr("img[class^=ProductCardImage--]", "src")),
    }
}
