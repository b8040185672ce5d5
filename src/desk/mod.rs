//! Trading Desk - read-only query interface
//!
//! Owns the trade sets generated at startup and the price oracle used to
//! mark open positions. Historic trades are immutable once generated;
//! active trades are re-marked on every query without touching the
//! stored records.

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::oracle::PriceOracle;
use crate::stats::{compute_statistics, StatisticsResponse, TradeStatistics};
use crate::synth::{SynthConfig, TradeSynthesizer};
use crate::types::{ActiveTrade, ActiveTradeQuote, Asset, HistoricTrade, Leverage, Signal, TradeRecord};

/// Page size when the caller gives none
pub const DEFAULT_HISTORIC_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeskError {
    #[error("Trade not found: {0}")]
    TradeNotFound(String),
}

/// Leverage-amplified percentage PnL of an open position
pub fn unrealized_pnl(signal: Signal, entry: f64, current: f64, leverage: Leverage) -> f64 {
    signal.sign() * (current - entry) / entry * 100.0 * leverage.multiplier()
}

#[derive(Debug)]
pub struct TradingDesk {
    historic: Vec<HistoricTrade>,
    active: Vec<ActiveTrade>,
    oracle: PriceOracle,
}

impl TradingDesk {
    /// Desk over pre-built trade sets. `historic` is sorted most recent
    /// first here so paging is always a prefix of the sorted set.
    pub fn new(mut historic: Vec<HistoricTrade>, active: Vec<ActiveTrade>, oracle: PriceOracle) -> Self {
        historic.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self {
            historic,
            active,
            oracle,
        }
    }

    /// Generate both trade sets once, anchored at `now`
    pub fn bootstrap<R: Rng + ?Sized>(
        config: &SynthConfig,
        oracle: PriceOracle,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Self {
        let synth = TradeSynthesizer::new(config.clone(), now);
        let historic = synth.historic_trades(rng);
        let active = synth.active_trades(rng);

        tracing::info!(
            historic = historic.len(),
            active = active.len(),
            "Trading desk ready"
        );

        Self::new(historic, active, oracle)
    }

    /// Open positions marked against the latest prices
    pub async fn list_active_trades(&self) -> Vec<ActiveTradeQuote> {
        let prices = self.oracle.current_prices().await;

        self.active
            .iter()
            .map(|trade| {
                let current = prices
                    .get(&trade.asset)
                    .copied()
                    .unwrap_or_else(|| trade.asset.fallback_price());
                let pnl = unrealized_pnl(trade.signal, trade.entry, current, trade.leverage);

                ActiveTradeQuote {
                    trade: trade.clone(),
                    current,
                    unrealized_pnl: pnl,
                    is_profit: pnl > 0.0,
                }
            })
            .collect()
    }

    /// First `limit` historic trades, most recent first
    pub fn list_historic_trades(&self, limit: usize) -> &[HistoricTrade] {
        &self.historic[..limit.min(self.historic.len())]
    }

    /// Look up a trade by id, historic set first
    pub fn get_trade_by_id(&self, id: &str) -> Result<TradeRecord, DeskError> {
        self.historic
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .map(TradeRecord::Historic)
            .or_else(|| {
                self.active
                    .iter()
                    .find(|t| t.id == id)
                    .cloned()
                    .map(TradeRecord::Active)
            })
            .ok_or_else(|| DeskError::TradeNotFound(id.to_string()))
    }

    /// Statistics as of `now`
    pub fn statistics_at(&self, now: DateTime<Utc>) -> TradeStatistics {
        compute_statistics(&self.historic, now)
    }

    /// Statistics as served by the API
    pub fn get_statistics(&self) -> StatisticsResponse {
        self.statistics_at(Utc::now()).to_response()
    }

    pub async fn current_prices(&self) -> std::collections::HashMap<Asset, f64> {
        self.oracle.current_prices().await
    }

    pub fn historic_trades(&self) -> &[HistoricTrade] {
        &self.historic
    }

    pub fn active_trades(&self) -> &[ActiveTrade] {
        &self.active
    }
}
