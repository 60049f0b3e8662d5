//! Sellers command.

use console::style;

use crate::config::Settings;
use crate::sellers::QUERY_PLACEHOLDER;

/// List the sellers a search would contact.
pub fn cmd_sellers(settings: &Settings) -> anyhow::Result<()> {
    let sellers = settings.load_sellers()?;

    if sellers.is_empty() {
        println!("{} No sellers enabled", style("!").yellow());
        return Ok(());
    }

    for seller in &sellers {
        println!("{} {} ({})", style("•").cyan(), seller.name(), seller.id());
        // Show the template with its placeholder rather than an encoded value
        println!(
            "    {}{}",
            seller.descriptor.base_url,
            style(&seller.descriptor.search_path).dim()
        );
        let optional: Vec<&str> = [
            seller.was_price.as_ref().map(|_| "was-price"),
            seller.discount.as_ref().map(|_| "discount"),
            seller.image.as_ref().map(|_| "image"),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !optional.is_empty() {
            println!("    extracts: {}", optional.join(", "));
        }
    }

    println!(
        "\n{} {} sellers; search paths substitute {}",
        style("✓").green(),
        sellers.len(),
        QUERY_PLACEHOLDER
    );

    Ok(())
}
