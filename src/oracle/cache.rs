//! Time-boxed price cache
//!
//! Holds the last successful price map together with the instant it was
//! fetched. The caller supplies "now", so expiry is testable without
//! sleeping.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::types::Asset;

#[derive(Debug, Clone)]
struct CachedPrices {
    prices: HashMap<Asset, f64>,
    fetched_at: DateTime<Utc>,
}

/// Price map with a freshness window
#[derive(Debug, Clone)]
pub struct PriceCache {
    entry: Option<CachedPrices>,
    ttl: Duration,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entry: None, ttl }
    }

    /// Cached prices, if fetched no more than `ttl` before `now`
    pub fn get(&self, now: DateTime<Utc>) -> Option<&HashMap<Asset, f64>> {
        self.entry
            .as_ref()
            .filter(|entry| now - entry.fetched_at <= self.ttl)
            .map(|entry| &entry.prices)
    }

    pub fn store(&mut self, prices: HashMap<Asset, f64>, now: DateTime<Utc>) {
        self.entry = Some(CachedPrices {
            prices,
            fetched_at: now,
        });
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|entry| entry.fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cache_misses() {
        let cache = PriceCache::new(Duration::seconds(60));
        assert!(cache.get(Utc::now()).is_none());
        assert!(cache.fetched_at().is_none());
    }

    #[test]
    fn entry_expires_after_ttl() {
        let mut cache = PriceCache::new(Duration::seconds(60));
        let t0 = Utc::now();
        cache.store(HashMap::from([(Asset::ETH, 2_700.0)]), t0);

        assert!(cache.get(t0 + Duration::seconds(60)).is_some());
        assert!(cache.get(t0 + Duration::seconds(61)).is_none());
    }
}
