//! Perpguin server binary
//!
//! Generates the synthetic trade sets once at startup and serves the site
//! and REST API until shut down.

use anyhow::{Context, Result};
use std::time::Duration;
use perpguin::config::AppConfig;
use perpguin::desk::TradingDesk;
use perpguin::oracle::{CoinGeckoClient, FixedPrices, PriceFetcher, PriceOracle};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "perpguin=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    info!("Configuration loaded: {}", config);

    let fetcher: Arc<dyn PriceFetcher> = if config.prices.offline {
        info!("Offline mode: serving static reference prices");
        Arc::new(FixedPrices)
    } else {
        Arc::new(
            CoinGeckoClient::new(
                &config.prices.api_url,
                Duration::from_millis(config.prices.timeout_ms),
            )
            .context("Failed to create price API client")?,
        )
    };

    let ttl = config.prices.cache_ttl()?;
    let oracle = PriceOracle::new(fetcher, ttl);

    let desk = {
        let mut rng = rand::thread_rng();
        TradingDesk::bootstrap(&config.generator, oracle, &mut rng, chrono::Utc::now())
    };

    perpguin::server::start_server(Arc::new(desk), &config.server).await
}
