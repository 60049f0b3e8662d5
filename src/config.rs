//! Configuration management for pricewise using the prefer crate.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::DbContext;
use crate::sellers::{load_sellers, DescriptorError, SellerDescriptor, SellerRules};

/// Default search cache TTL in days.
pub const DEFAULT_SEARCH_EXPIRY_DAYS: u64 = 7;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "pricewise.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Whether the search cache is used. When false every search scrapes.
    pub db_available: bool,
    /// Days before a cached search is refreshed.
    pub search_expiry_days: u64,
    /// User agent setting: unset for the default browser string,
    /// "rotate" to pick one browser string per client when it is built,
    /// anything else is sent as is.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Delay between requests to one domain in milliseconds.
    pub request_delay_ms: u64,
    /// Attempts per page fetch.
    pub fetch_attempts: u32,
    /// Upper bound on one seller's fetch in seconds.
    pub seller_timeout_secs: u64,
    /// Seller pages fetched at the same time.
    pub max_concurrent_fetches: usize,
    /// Scraping proxy endpoint.
    pub proxy_url: Option<String>,
    /// Scraping proxy API key.
    pub proxy_api_key: Option<String>,
    /// Descriptor overrides and additions keyed by seller id.
    pub sellers: HashMap<String, SellerDescriptor>,
    /// Seller ids to search, in order. Empty means all.
    pub enabled_sellers: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pricewise");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            db_available: true,
            search_expiry_days: DEFAULT_SEARCH_EXPIRY_DAYS,
            user_agent: None,
            request_timeout: 30,
            request_delay_ms: 0,
            fetch_attempts: 2,
            seller_timeout_secs: 30,
            max_concurrent_fetches: 4,
            proxy_url: None,
            proxy_api_key: None,
            sellers: HashMap::new(),
            enabled_sellers: Vec::new(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn seller_timeout(&self) -> Duration {
        Duration::from_secs(self.seller_timeout_secs)
    }

    /// Compile the configured sellers.
    pub fn load_sellers(&self) -> Result<Vec<Arc<SellerRules>>, DescriptorError> {
        load_sellers(&self.sellers, &self.enabled_sellers)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Database URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Whether to use the search cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_available: Option<bool>,
    /// Days before a cached search is refreshed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_expiry_days: Option<u64>,
    /// User agent string or "rotate".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay between requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    /// Attempts per page fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_attempts: Option<u32>,
    /// Upper bound on one seller's fetch in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_timeout_secs: Option<u64>,
    /// Seller pages fetched at the same time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_fetches: Option<usize>,
    /// Scraping proxy endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Scraping proxy API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_api_key: Option<String>,
    /// Seller descriptor overrides and additions.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub sellers: HashMap<String, SellerDescriptor>,
    /// Seller ids to search, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enabled_sellers: Vec<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers pricewise config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("pricewise").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = Self::parse(path, &contents)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_error("TOML", e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| parse_error("YAML", e.to_string()))
            }
            _ => serde_json::from_str(contents).map_err(|e| parse_error("JSON", e.to_string())),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    /// `base_dir` is used to resolve relative paths (typically config file dir or CWD).
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref url) = self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(available) = self.db_available {
            settings.db_available = available;
        }
        if let Some(days) = self.search_expiry_days {
            settings.search_expiry_days = days;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.request_delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(attempts) = self.fetch_attempts {
            settings.fetch_attempts = attempts;
        }
        if let Some(secs) = self.seller_timeout_secs {
            settings.seller_timeout_secs = secs;
        }
        if let Some(max) = self.max_concurrent_fetches {
            settings.max_concurrent_fetches = max;
        }
        if let Some(ref proxy) = self.proxy_url {
            settings.proxy_url = Some(proxy.clone());
        }
        if let Some(ref key) = self.proxy_api_key {
            settings.proxy_api_key = Some(key.clone());
        }
        for (id, descriptor) in &self.sellers {
            settings.sellers.insert(id.clone(), descriptor.clone());
        }
        if !self.enabled_sellers.is_empty() {
            settings.enabled_sellers = self.enabled_sellers.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory (--data-dir flag).
    pub data_dir: Option<PathBuf>,
}

/// Parse a boolean environment value.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Apply environment overrides, which take precedence over config files.
///
/// `lookup` reads one variable; empty values count as unset.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|s| !s.is_empty());

    if let Some(url) = var("DATABASE_URL") {
        tracing::debug!("Using DATABASE_URL from environment: {}", url);
        settings.database_url = Some(url);
    }
    if let Some(raw) = var("SEARCH_EXPIRY_IN_DAYS") {
        match raw.trim().parse() {
            Ok(days) => settings.search_expiry_days = days,
            Err(_) => tracing::warn!("Ignoring invalid SEARCH_EXPIRY_IN_DAYS: {}", raw),
        }
    }
    if let Some(raw) = var("DB_AVAILABLE") {
        match parse_bool(&raw) {
            Some(available) => settings.db_available = available,
            None => tracing::warn!("Ignoring invalid DB_AVAILABLE: {}", raw),
        }
    }
    if let Some(proxy) = var("PROXY_URL") {
        settings.proxy_url = Some(proxy);
    }
    if let Some(key) = var("PROXY_API_KEY") {
        settings.proxy_api_key = Some(key);
    }
    if let Some(user_agent) = var("PRICEWISE_USER_AGENT") {
        settings.user_agent = Some(user_agent);
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    // An explicit --config must load; discovered files fall back to defaults.
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base_dir = config.base_dir().unwrap_or_else(|| cwd.clone());

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    // --data-dir takes precedence over the config file
    if let Some(data_dir) = options.data_dir {
        settings.data_dir = config.resolve_path(&data_dir.to_string_lossy(), &cwd);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    Ok((settings, config))
}
