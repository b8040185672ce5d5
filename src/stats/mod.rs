//! Statistics Aggregator
//!
//! Summary metrics over the historic trade set:
//! - Win rate
//! - Average win/loss magnitude and the derived risk/reward ratio
//! - A damped, clamped weekly ROI display figure

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::HistoricTrade;

/// Weekly ROI is the summed unleveraged return divided by this
pub const WEEKLY_ROI_DAMPING: f64 = 10.0;
/// Display bounds for weekly ROI, in percent
pub const WEEKLY_ROI_MIN: f64 = 0.5;
pub const WEEKLY_ROI_MAX: f64 = 8.5;
/// Lookback for the weekly ROI window
pub const WEEKLY_WINDOW_HOURS: i64 = 7 * 24;

/// Shown in place of risk/reward when either side has no trades
pub const UNDEFINED_RATIO: &str = "N/A";

/// Numeric statistics over a historic trade set
#[derive(Debug, Clone, PartialEq)]
pub struct TradeStatistics {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage of winning trades (0 when there are no trades)
    pub win_rate: f64,
    /// Mean |pnl| of winning trades
    pub avg_win: f64,
    /// Mean |pnl| of losing trades
    pub avg_loss: f64,
    /// `avg_win / avg_loss`; `None` without both wins and losses
    pub risk_reward: Option<f64>,
    /// Clamped weekly ROI in percent
    pub weekly_roi: f64,
    /// Trades inside the weekly window
    pub weekly_trades: usize,
}

/// Wire shape for `/api/statistics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResponse {
    #[serde(rename = "winRate")]
    pub win_rate: String,
    #[serde(rename = "riskReward")]
    pub risk_reward: String,
    #[serde(rename = "weeklyROI")]
    pub weekly_roi: String,
    #[serde(rename = "totalSignals")]
    pub total_signals: usize,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Raw weekly ROI before clamping: sum of unleveraged returns (percent)
/// over trades newer than `now - 7d`, damped
fn raw_weekly_roi(trades: &[HistoricTrade], now: DateTime<Utc>) -> (f64, usize) {
    let cutoff = now - Duration::hours(WEEKLY_WINDOW_HOURS);
    let (sum, count) = trades
        .iter()
        .filter(|t| t.timestamp > cutoff)
        .fold((0.0, 0usize), |(sum, n), t| {
            (sum + t.pnl / t.leverage.multiplier(), n + 1)
        });

    if count == 0 {
        (0.0, 0)
    } else {
        (sum / WEEKLY_ROI_DAMPING, count)
    }
}

/// Aggregate statistics for `trades` as of `now`
pub fn compute_statistics(trades: &[HistoricTrade], now: DateTime<Utc>) -> TradeStatistics {
    let total_trades = trades.len();
    let wins = trades.iter().filter(|t| t.is_win).count();
    let losses = total_trades - wins;

    let win_rate = if total_trades > 0 {
        wins as f64 / total_trades as f64 * 100.0
    } else {
        0.0
    };

    let avg_win = mean(trades.iter().filter(|t| t.is_win).map(|t| t.pnl.abs()));
    let avg_loss = mean(trades.iter().filter(|t| !t.is_win).map(|t| t.pnl.abs()));

    let risk_reward = match (avg_win, avg_loss) {
        (Some(w), Some(l)) if l > 0.0 => Some(w / l),
        _ => None,
    };

    let (raw_roi, weekly_trades) = raw_weekly_roi(trades, now);

    TradeStatistics {
        total_trades,
        wins,
        losses,
        win_rate,
        avg_win: avg_win.unwrap_or(0.0),
        avg_loss: avg_loss.unwrap_or(0.0),
        risk_reward,
        weekly_roi: raw_roi.clamp(WEEKLY_ROI_MIN, WEEKLY_ROI_MAX),
        weekly_trades,
    }
}

impl TradeStatistics {
    pub fn to_response(&self) -> StatisticsResponse {
        StatisticsResponse {
            win_rate: format!("{:.1}", self.win_rate),
            risk_reward: self
                .risk_reward
                .map(|rr| format!("{:.2}", rr))
                .unwrap_or_else(|| UNDEFINED_RATIO.to_string()),
            weekly_roi: format!("{:.1}", self.weekly_roi),
            total_signals: self.total_trades,
        }
    }
}
