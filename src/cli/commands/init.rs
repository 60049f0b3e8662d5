//! Initialize command.

use console::style;

use crate::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.db_available {
        println!(
            "{} Persistence is disabled (DB_AVAILABLE=false); nothing to initialize",
            style("!").yellow()
        );
        return Ok(());
    }

    settings.ensure_directories()?;

    let ctx = settings.create_db_context();
    ctx.init_schema().await?;

    let products = ctx.products().count().await?;
    let searches = ctx.searches().count().await?;

    println!(
        "{} Initialized pricewise database at {}",
        style("✓").green(),
        settings.database_url()
    );
    println!("  {} products, {} cached searches", products, searches);

    let sellers = settings.load_sellers()?;
    if sellers.is_empty() {
        println!("{} No sellers enabled", style("!").yellow());
    } else {
        let ids: Vec<&str> = sellers.iter().map(|s| s.id()).collect();
        println!("  Sellers: {}", ids.join(", "));
    }

    Ok(())
}
