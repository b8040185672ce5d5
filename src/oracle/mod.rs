//! Oracle module - Reference prices for the synthetic desk
//!
//! Serves current USD prices from a short-lived cache in front of a
//! [`PriceFetcher`], falling back to the static per-asset table whenever
//! the live lookup fails, and back-projects randomized historical prices
//! for trade generation.

mod cache;
pub mod sources;

pub use cache::PriceCache;
pub use sources::{CoinGeckoClient, FixedPrices, PriceError, PriceFetcher};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::Asset;

/// Default cache freshness window
pub const DEFAULT_PRICE_TTL_SECS: i64 = 60;

/// Source of "now" for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Static fallback price for every asset
pub fn fallback_prices() -> HashMap<Asset, f64> {
    Asset::ALL
        .iter()
        .map(|&asset| (asset, asset.fallback_price()))
        .collect()
}

/// Randomized back-projection of an asset's price `hours_ago`.
///
/// `price = base * (1 - daily_change * days_ago)` with `daily_change`
/// drawn uniformly from `[-volatility, +volatility]`. Every call makes a
/// fresh draw.
pub fn historical_price<R: Rng + ?Sized>(asset: Asset, hours_ago: f64, rng: &mut R) -> f64 {
    let volatility = asset.volatility();
    let daily_change = rng.gen_range(-volatility..=volatility);
    let days_ago = hours_ago / 24.0;

    asset.fallback_price() * (1.0 - daily_change * days_ago)
}

/// Cached current-price lookup with static fallback
pub struct PriceOracle {
    fetcher: Arc<dyn PriceFetcher>,
    cache: RwLock<PriceCache>,
    clock: Arc<dyn Clock>,
}

impl PriceOracle {
    pub fn new(fetcher: Arc<dyn PriceFetcher>, ttl: Duration) -> Self {
        Self::with_clock(fetcher, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(fetcher: Arc<dyn PriceFetcher>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            cache: RwLock::new(PriceCache::new(ttl)),
            clock,
        }
    }

    /// Oracle that never touches the network
    pub fn offline() -> Self {
        Self::new(
            Arc::new(FixedPrices),
            Duration::seconds(DEFAULT_PRICE_TTL_SECS),
        )
    }

    /// Current USD price for every asset.
    ///
    /// Never fails: a fetch error is logged and answered with the fallback
    /// table, which is not cached so the next call retries the lookup.
    /// Concurrent callers that all miss may each issue a fetch.
    pub async fn current_prices(&self) -> HashMap<Asset, f64> {
        let now = self.clock.now();

        if let Some(prices) = self.cache.read().await.get(now) {
            tracing::debug!(source = self.fetcher.name(), "Serving cached prices");
            return prices.clone();
        }

        match self.fetcher.fetch(&Asset::ALL).await {
            Ok(live) => {
                let mut prices = fallback_prices();
                prices.extend(live);

                tracing::debug!(
                    source = self.fetcher.name(),
                    assets = prices.len(),
                    "Refreshed price cache"
                );

                self.cache.write().await.store(prices.clone(), now);
                prices
            }
            Err(e) => {
                tracing::warn!(
                    source = self.fetcher.name(),
                    error = %e,
                    "Using fallback prices due to price API error"
                );
                fallback_prices()
            }
        }
    }

    /// Current price for one asset
    pub async fn current_price(&self, asset: Asset) -> f64 {
        self.current_prices()
            .await
            .get(&asset)
            .copied()
            .unwrap_or_else(|| asset.fallback_price())
    }
}

impl std::fmt::Debug for PriceOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceOracle")
            .field("fetcher", &self.fetcher.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::sources::MockPriceFetcher;
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Mutex;

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Utc::now())))
        }

        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn live_btc(price: f64) -> HashMap<Asset, f64> {
        HashMap::from([(Asset::BTC, price)])
    }

    #[tokio::test]
    async fn fresh_cache_skips_fetch() {
        let mut fetcher = MockPriceFetcher::new();
        fetcher.expect_name().return_const("mock");
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(live_btc(70_000.0)));

        let clock = ManualClock::new();
        let oracle = PriceOracle::with_clock(Arc::new(fetcher), Duration::seconds(60), clock.clone());

        let first = oracle.current_prices().await;
        clock.advance(Duration::seconds(30));
        let second = oracle.current_prices().await;

        assert_eq!(first[&Asset::BTC], 70_000.0);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn expired_cache_refetches() {
        let mut fetcher = MockPriceFetcher::new();
        fetcher.expect_name().return_const("mock");
        let mut calls = 0.0;
        fetcher.expect_fetch().times(2).returning(move |_| {
            calls += 1.0;
            Ok(live_btc(60_000.0 + calls))
        });

        let clock = ManualClock::new();
        let oracle = PriceOracle::with_clock(Arc::new(fetcher), Duration::seconds(60), clock.clone());

        let first = oracle.current_price(Asset::BTC).await;
        clock.advance(Duration::seconds(61));
        let second = oracle.current_price(Asset::BTC).await;

        assert_eq!(first, 60_001.0);
        assert_eq!(second, 60_002.0);
    }

    #[tokio::test]
    async fn fetch_error_falls_back_without_caching() {
        let mut fetcher = MockPriceFetcher::new();
        fetcher.expect_name().return_const("mock");
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|_| Err(PriceError::Status(503)));

        let oracle = PriceOracle::with_clock(
            Arc::new(fetcher),
            Duration::seconds(60),
            ManualClock::new(),
        );

        assert_eq!(oracle.current_prices().await, fallback_prices());
        // Second call must retry rather than serve the fallback from cache
        assert_eq!(oracle.current_prices().await, fallback_prices());
    }

    #[tokio::test]
    async fn partial_live_prices_are_filled_from_fallback() {
        let mut fetcher = MockPriceFetcher::new();
        fetcher.expect_name().return_const("mock");
        fetcher
            .expect_fetch()
            .returning(|_| Ok(live_btc(71_234.5)));

        let oracle = PriceOracle::new(Arc::new(fetcher), Duration::seconds(60));
        let prices = oracle.current_prices().await;

        assert_eq!(prices.len(), Asset::ALL.len());
        assert_eq!(prices[&Asset::BTC], 71_234.5);
        assert_eq!(prices[&Asset::ADA], 0.45);
    }

    #[tokio::test]
    async fn offline_oracle_serves_static_table() {
        let oracle = PriceOracle::offline();
        assert_eq!(oracle.current_price(Asset::SOL).await, 140.0);
    }

    #[test]
    fn historical_price_stays_within_volatility_band() {
        let mut rng = StdRng::seed_from_u64(7);

        for asset in Asset::ALL {
            let base = asset.fallback_price();
            let max_move = asset.volatility() * 7.0;
            for _ in 0..200 {
                let price = historical_price(asset, 168.0, &mut rng);
                assert!(price > 0.0);
                assert!((price / base - 1.0).abs() <= max_move + 1e-12);
            }
        }
    }

    #[test]
    fn historical_price_at_zero_hours_is_base() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(historical_price(Asset::ETH, 0.0, &mut rng), 2_600.0);
    }
}
