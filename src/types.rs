//! Core types used throughout Perpguin
//!
//! Defines the asset universe, signal direction, leverage tiers and the
//! synthetic trade records served by the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Supported trading assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    BTC,
    ETH,
    SOL,
    BNB,
    ADA,
}

impl Default for Asset {
    fn default() -> Self {
        Asset::BTC
    }
}

impl Asset {
    /// Every asset the desk trades, in display order
    pub const ALL: [Asset; 5] = [Asset::BTC, Asset::ETH, Asset::SOL, Asset::BNB, Asset::ADA];

    /// CoinGecko coin id used by the simple price endpoint
    pub fn coingecko_id(&self) -> &'static str {
        match self {
            Asset::BTC => "bitcoin",
            Asset::ETH => "ethereum",
            Asset::SOL => "solana",
            Asset::BNB => "binancecoin",
            Asset::ADA => "cardano",
        }
    }

    /// Static USD reference price, used when the live lookup fails
    pub fn fallback_price(&self) -> f64 {
        match self {
            Asset::BTC => 67_000.0,
            Asset::ETH => 2_600.0,
            Asset::SOL => 140.0,
            Asset::BNB => 580.0,
            Asset::ADA => 0.45,
        }
    }

    /// Daily volatility coefficient for historical back-projection
    pub fn volatility(&self) -> f64 {
        match self {
            Asset::BTC => 0.03,
            Asset::ETH => 0.04,
            Asset::SOL => 0.06,
            Asset::BNB => 0.04,
            Asset::ADA => 0.05,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BTC" => Some(Asset::BTC),
            "ETH" => Some(Asset::ETH),
            "SOL" => Some(Asset::SOL),
            "BNB" => Some(Asset::BNB),
            "ADA" => Some(Asset::ADA),
            _ => None,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::BTC => write!(f, "BTC"),
            Asset::ETH => write!(f, "ETH"),
            Asset::SOL => write!(f, "SOL"),
            Asset::BNB => write!(f, "BNB"),
            Asset::ADA => write!(f, "ADA"),
        }
    }
}

/// Position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Long,
    Short,
}

impl Default for Signal {
    fn default() -> Self {
        Signal::Long
    }
}

impl Signal {
    /// +1 for LONG, -1 for SHORT
    pub fn sign(&self) -> f64 {
        match self {
            Signal::Long => 1.0,
            Signal::Short => -1.0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Long => write!(f, "LONG"),
            Signal::Short => write!(f, "SHORT"),
        }
    }
}

/// Leverage tiers offered on signals.
///
/// Serialized as `"5x"` because the frontend renders the raw string and
/// recovers the multiplier with `parseInt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Leverage {
    X2,
    X3,
    X5,
    X10,
}

impl Leverage {
    pub const ALL: [Leverage; 4] = [Leverage::X2, Leverage::X3, Leverage::X5, Leverage::X10];

    pub fn multiplier(&self) -> f64 {
        match self {
            Leverage::X2 => 2.0,
            Leverage::X3 => 3.0,
            Leverage::X5 => 5.0,
            Leverage::X10 => 10.0,
        }
    }

    /// Parse "5x", "5X" or a bare "5"
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().trim_end_matches(['x', 'X']) {
            "2" => Some(Leverage::X2),
            "3" => Some(Leverage::X3),
            "5" => Some(Leverage::X5),
            "10" => Some(Leverage::X10),
            _ => None,
        }
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.multiplier() as u32)
    }
}

impl Serialize for Leverage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Leverage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Leverage::from_str(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown leverage tier: {raw}")))
    }
}

/// Closed synthetic position with a realized outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricTrade {
    /// Stable id (`historic_<n>`)
    pub id: String,
    /// When the position was opened
    pub timestamp: DateTime<Utc>,
    pub asset: Asset,
    pub signal: Signal,
    pub entry: f64,
    pub exit: f64,
    pub leverage: Leverage,
    /// Leverage-amplified return in percent
    pub pnl: f64,
    /// Cosmetic display value in [70, 100]
    pub confidence: f64,
    pub is_win: bool,
}

impl HistoricTrade {
    /// Unleveraged fractional return implied by `pnl`
    pub fn base_return(&self) -> f64 {
        self.pnl / self.leverage.multiplier() / 100.0
    }
}

/// Open synthetic position; no outcome yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTrade {
    /// Stable id (`active_<n>`)
    pub id: String,
    pub asset: Asset,
    pub signal: Signal,
    pub entry: f64,
    pub leverage: Leverage,
    /// Cosmetic display value in [75, 95]
    pub confidence: f64,
    pub entry_time: DateTime<Utc>,
}

/// Active trade marked against a current price
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTradeQuote {
    #[serde(flatten)]
    pub trade: ActiveTrade,
    pub current: f64,
    pub unrealized_pnl: f64,
    pub is_profit: bool,
}

/// Any stored trade, as returned by an id lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TradeRecord {
    Historic(HistoricTrade),
    Active(ActiveTrade),
}

impl TradeRecord {
    pub fn id(&self) -> &str {
        match self {
            TradeRecord::Historic(t) => &t.id,
            TradeRecord::Active(t) => &t.id,
        }
    }
}
