//! Configuration management for Perpguin
//!
//! Loads defaults, optional `config/default` and `config/local` files, and
//! environment variables (`PERPGUIN__SECTION__KEY`) via .env

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::oracle::sources::COINGECKO_API_URL;
use crate::synth::SynthConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub prices: PricesConfig,
    pub generator: SynthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Listen port (a bare `PORT` env var overrides)
    pub port: u16,
    /// Directory holding the HTML/CSS/JS pages
    pub static_dir: String,
    /// Page size for `/api/historic-trades` without a usable `limit`
    pub default_historic_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricesConfig {
    /// Base URL of the simple-price API
    pub api_url: String,
    /// Price cache freshness window in seconds
    pub cache_ttl_secs: u64,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Skip the network and always use the static price table
    pub offline: bool,
}

impl PricesConfig {
    /// Cache freshness window, rejecting values chrono cannot represent
    pub fn cache_ttl(&self) -> Result<chrono::Duration> {
        let secs = i64::try_from(self.cache_ttl_secs)
            .with_context(|| format!("prices.cache_ttl_secs out of range: {}", self.cache_ttl_secs))?;
        chrono::Duration::try_seconds(secs)
            .with_context(|| format!("prices.cache_ttl_secs out of range: {}", secs))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "public".to_string(),
            default_historic_limit: crate::desk::DEFAULT_HISTORIC_LIMIT,
        }
    }
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            api_url: COINGECKO_API_URL.to_string(),
            cache_ttl_secs: crate::oracle::DEFAULT_PRICE_TTL_SECS as u64,
            timeout_ms: 5000,
            offline: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            prices: PricesConfig::default(),
            generator: SynthConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.static_dir", "public")?
            .set_default("server.default_historic_limit", 20)?
            // Price source defaults
            .set_default("prices.api_url", COINGECKO_API_URL)?
            .set_default("prices.cache_ttl_secs", 60)?
            .set_default("prices.timeout_ms", 5000)?
            .set_default("prices.offline", false)?
            // Generator defaults
            .set_default("generator.historic_count", 142)?
            .set_default("generator.target_win_rate", 0.673)?
            .set_default("generator.active_min", 2)?
            .set_default("generator.active_max", 4)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PERPGUIN__*)
            .add_source(
                Environment::with_prefix("PERPGUIN")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        // Plain PORT wins, as on most hosting platforms
        if let Ok(port) = std::env::var("PORT") {
            builder = builder
                .set_override("server.port", port)
                .context("Invalid PORT override")?;
        }

        let config = builder.build().context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// One-line summary for the startup log
    pub fn digest(&self) -> String {
        format!(
            "addr={}:{} static_dir={} offline={} price_ttl={}s historic={} target_win_rate={:.3}",
            self.server.host,
            self.server.port,
            self.server.static_dir,
            self.prices.offline,
            self.prices.cache_ttl_secs,
            self.generator.historic_count,
            self.generator.target_win_rate
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
