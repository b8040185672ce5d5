//! Price fetcher implementations (CoinGecko, static table)

mod coingecko;

pub use coingecko::{CoinGeckoClient, COINGECKO_API_URL};

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::types::Asset;

/// Errors raised by a price lookup. The oracle recovers from all of them.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error("price request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("price API returned HTTP {0}")]
    Status(u16),
    #[error("malformed price response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Trait for current-price lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    /// Get the source name
    fn name(&self) -> &'static str;

    /// Fetch USD prices. Assets absent from the result are priced from
    /// the fallback table by the caller.
    async fn fetch(&self, assets: &[Asset]) -> Result<HashMap<Asset, f64>, PriceError>;
}

/// Fetcher that always answers with the static fallback table
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedPrices;

#[async_trait]
impl PriceFetcher for FixedPrices {
    fn name(&self) -> &'static str {
        "Fixed"
    }

    async fn fetch(&self, assets: &[Asset]) -> Result<HashMap<Asset, f64>, PriceError> {
        Ok(assets
            .iter()
            .map(|&asset| (asset, asset.fallback_price()))
            .collect())
    }
}
