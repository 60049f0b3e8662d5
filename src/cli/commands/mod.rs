//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod init;
mod search;
mod sellers;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "pricewise")]
#[command(about = "Grocery price comparison across online supermarkets")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory holding the database (overrides config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Search every seller and print results cheapest per unit first
    Search {
        /// Product to search for
        #[arg(required = true, num_args = 1..)]
        term: Vec<String>,
        /// Display currency, by name or ISO code (e.g. UK, GBP)
        #[arg(long, default_value = "EUR")]
        currency: String,
        /// Scrape the sellers even when a fresh cached result exists
        #[arg(long)]
        no_cache: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Show at most this many results (0 = all)
        #[arg(short, long, default_value = "0")]
        limit: usize,
    },

    /// Start the HTTP API server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:3030)
        #[arg(default_value = "127.0.0.1:3030")]
        bind: String,
    },

    /// List configured sellers and their search URLs
    Sellers,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let (settings, _config) = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Search {
            term,
            currency,
            no_cache,
            json,
            limit,
        } => {
            let options = search::SearchOptions {
                currency,
                no_cache,
                json,
                limit,
            };
            search::cmd_search(&settings, &term.join(" "), options).await
        }
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
        Commands::Sellers => sellers::cmd_sellers(&settings),
    }
}
