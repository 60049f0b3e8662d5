//! Search command.

use console::style;

use crate::config::Settings;
use crate::currency;
use crate::models::Product;
use crate::services::{SearchOutcome, SearchService};

/// Flags for a CLI search.
pub struct SearchOptions {
    pub currency: String,
    pub no_cache: bool,
    pub json: bool,
    pub limit: usize,
}

/// Search every seller and print the ranked results.
pub async fn cmd_search(
    settings: &Settings,
    term: &str,
    options: SearchOptions,
) -> anyhow::Result<()> {
    // Fail on a bad currency before any seller is contacted
    currency::find(&options.currency)?;

    if settings.db_available {
        settings.ensure_directories()?;
        settings.create_db_context().init_schema().await?;
    }

    let service = SearchService::from_settings(settings)?;
    if !options.json {
        println!(
            "{} Searching {} sellers for '{}'...",
            style("→").cyan(),
            service.orchestrator().sellers().len(),
            term
        );
    }

    let outcome = if options.no_cache {
        service.search_uncached(term).await?
    } else {
        service.search(term).await?
    };

    let (mut products, source) = match outcome {
        SearchOutcome::Results { products, source } => (products, source),
        SearchOutcome::NoResults => {
            if options.json {
                println!("[]");
            } else {
                println!("{} No products found for '{}'", style("✗").red(), term);
            }
            return Ok(());
        }
    };

    currency::convert(&mut products, &options.currency)?;
    if options.limit > 0 {
        products.truncate(options.limit);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    println!(
        "{} {} products ({})",
        style("✓").green(),
        products.len(),
        source.as_str()
    );
    for (idx, product) in products.iter().enumerate() {
        println!("{:>3}. {}", idx + 1, describe(product));
        println!("     {}", style(&product.url).dim());
    }

    Ok(())
}

/// One-line summary: seller, name, price and per-unit price, with the
/// discounted figures when the listing is on offer.
fn describe(product: &Product) -> String {
    let symbol = &product.currency;
    let mut line = format!(
        "[{}] {}  {}{:.2} ({}{:.2}/{})",
        product.seller,
        product.name,
        symbol,
        product.price,
        symbol,
        product.price_per_unit,
        product.unit_type
    );

    if product.has_discount() {
        line.push_str(&format!(
            "  now {}{:.2} ({}{:.2}/{})",
            symbol,
            product.discount_price,
            symbol,
            product.discount_price_per_unit,
            product.unit_type
        ));
    } else if !product.discount_price_in_words.is_empty() {
        line.push_str(&format!("  {}", product.discount_price_in_words));
    }

    line
}
