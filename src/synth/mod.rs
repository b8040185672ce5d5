//! Trade Synthesizer
//!
//! Generates the fixed historic trade set and the open positions shown on
//! the site. Each historic outcome is planned first (see [`quota`]) and
//! the prices are derived from it, so the aggregate win rate matches the
//! configured target no matter how the price draws fall.

pub mod quota;

pub use quota::{plan_outcomes, win_quota, QuotaState};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Deserialize;

use crate::oracle::historical_price;
use crate::types::{ActiveTrade, Asset, HistoricTrade, Leverage, Signal};

/// Historic trades are dated 1..=168 hours back
pub const HISTORIC_MAX_HOURS_AGO: i64 = 168;
/// Active trades are dated 1..=24 hours back
pub const ACTIVE_MAX_HOURS_AGO: i64 = 24;

/// Unleveraged return band for winning trades (mean 8.7%)
pub const WIN_RETURN_RANGE: (f64, f64) = (0.037, 0.137);
/// Unleveraged loss magnitude band (mean 5.8%)
pub const LOSS_RETURN_RANGE: (f64, f64) = (0.038, 0.078);
/// Entry jitter around the back-projected price
pub const ENTRY_JITTER: f64 = 0.01;

#[derive(Debug, Clone, Deserialize)]
pub struct SynthConfig {
    /// Number of closed trades to generate
    pub historic_count: usize,
    /// Fraction of historic trades that must be wins
    pub target_win_rate: f64,
    /// Inclusive bounds on the number of open trades
    pub active_min: usize,
    pub active_max: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            historic_count: 142,
            target_win_rate: 0.673,
            active_min: 2,
            active_max: 4,
        }
    }
}

/// Exit price implied by a realized unleveraged return
pub fn exit_price(entry: f64, signal: Signal, base_return: f64) -> f64 {
    entry * (1.0 + signal.sign() * base_return)
}

fn random_asset<R: Rng + ?Sized>(rng: &mut R) -> Asset {
    Asset::ALL[rng.gen_range(0..Asset::ALL.len())]
}

fn random_signal<R: Rng + ?Sized>(rng: &mut R) -> Signal {
    if rng.gen_bool(0.5) {
        Signal::Long
    } else {
        Signal::Short
    }
}

fn random_leverage<R: Rng + ?Sized>(rng: &mut R) -> Leverage {
    Leverage::ALL[rng.gen_range(0..Leverage::ALL.len())]
}

/// Generator anchored at a fixed "now"
#[derive(Debug, Clone)]
pub struct TradeSynthesizer {
    config: SynthConfig,
    now: DateTime<Utc>,
}

impl TradeSynthesizer {
    pub fn new(config: SynthConfig, now: DateTime<Utc>) -> Self {
        Self { config, now }
    }

    /// Closed trades, most recent first
    pub fn historic_trades<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<HistoricTrade> {
        let count = self.config.historic_count;
        let outcomes = plan_outcomes(count, self.config.target_win_rate, rng);

        let mut trades: Vec<HistoricTrade> = outcomes
            .into_iter()
            .enumerate()
            .map(|(i, is_win)| self.historic_trade(i, is_win, rng))
            .collect();

        trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let wins = trades.iter().filter(|t| t.is_win).count();
        let rate = if count > 0 {
            wins as f64 / count as f64 * 100.0
        } else {
            0.0
        };
        tracing::info!(
            total = count,
            wins,
            "Generated {} historic trades with {} wins ({:.1}% win rate)",
            count,
            wins,
            rate
        );

        trades
    }

    fn historic_trade<R: Rng + ?Sized>(&self, index: usize, is_win: bool, rng: &mut R) -> HistoricTrade {
        let asset = random_asset(rng);
        let signal = random_signal(rng);
        let leverage = random_leverage(rng);
        let hours_ago = rng.gen_range(1..=HISTORIC_MAX_HOURS_AGO);

        let base = historical_price(asset, hours_ago as f64, rng);
        let entry = base * (1.0 + rng.gen_range(-ENTRY_JITTER..=ENTRY_JITTER));

        let base_return = if is_win {
            rng.gen_range(WIN_RETURN_RANGE.0..WIN_RETURN_RANGE.1)
        } else {
            -rng.gen_range(LOSS_RETURN_RANGE.0..LOSS_RETURN_RANGE.1)
        };

        HistoricTrade {
            id: format!("historic_{index}"),
            timestamp: self.now - Duration::hours(hours_ago),
            asset,
            signal,
            entry,
            exit: exit_price(entry, signal, base_return),
            leverage,
            pnl: base_return * 100.0 * leverage.multiplier(),
            confidence: rng.gen_range(70.0..100.0),
            is_win,
        }
    }

    /// Open positions with no resolved outcome
    pub fn active_trades<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ActiveTrade> {
        let min = self.config.active_min;
        let max = self.config.active_max.max(min);
        let count = rng.gen_range(min..=max);

        (0..count)
            .map(|i| {
                let asset = random_asset(rng);
                let signal = random_signal(rng);
                let leverage = random_leverage(rng);
                let hours_ago = rng.gen_range(1..=ACTIVE_MAX_HOURS_AGO);

                ActiveTrade {
                    id: format!("active_{i}"),
                    asset,
                    signal,
                    entry: historical_price(asset, hours_ago as f64, rng),
                    leverage,
                    confidence: rng.gen_range(75.0..95.0),
                    entry_time: self.now - Duration::hours(hours_ago),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn synth() -> TradeSynthesizer {
        TradeSynthesizer::new(SynthConfig::default(), Utc::now())
    }

    #[test]
    fn default_set_has_exactly_96_wins() {
        let mut rng = StdRng::seed_from_u64(42);
        let trades = synth().historic_trades(&mut rng);

        assert_eq!(trades.len(), 142);
        assert_eq!(trades.iter().filter(|t| t.is_win).count(), 96);
    }

    #[test]
    fn exit_price_matches_pnl_and_signal() {
        let mut rng = StdRng::seed_from_u64(11);
        for trade in synth().historic_trades(&mut rng) {
            let base_return = trade.pnl / trade.leverage.multiplier() / 100.0;
            let expected = match trade.signal {
                Signal::Long => trade.entry * (1.0 + base_return),
                Signal::Short => trade.entry * (1.0 - base_return),
            };
            assert!(
                (expected - trade.exit).abs() <= 1e-9 * trade.entry.max(1.0),
                "{}: exit {} != {}",
                trade.id,
                trade.exit,
                expected
            );
        }
    }

    #[test]
    fn win_flag_agrees_with_pnl_sign_and_return_bands() {
        let mut rng = StdRng::seed_from_u64(5);
        for trade in synth().historic_trades(&mut rng) {
            assert_eq!(trade.is_win, trade.pnl > 0.0);
            let magnitude = trade.base_return().abs();
            let (lo, hi) = if trade.is_win {
                WIN_RETURN_RANGE
            } else {
                LOSS_RETURN_RANGE
            };
            assert!(magnitude >= lo - 1e-12 && magnitude <= hi + 1e-12);
        }
    }

    #[test]
    fn historic_set_is_sorted_recent_first_within_a_week() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(9);
        let trades = TradeSynthesizer::new(SynthConfig::default(), now).historic_trades(&mut rng);

        assert!(trades.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        for trade in &trades {
            let age = now - trade.timestamp;
            assert!(age >= Duration::hours(1) && age <= Duration::hours(HISTORIC_MAX_HOURS_AGO));
            assert!((70.0..100.0).contains(&trade.confidence));
            assert!(trade.entry > 0.0 && trade.exit > 0.0);
        }
    }

    #[test]
    fn ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(1);
        let trades = synth().historic_trades(&mut rng);
        let ids: HashSet<&str> = trades.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), trades.len());
    }

    #[test]
    fn active_trades_respect_count_and_age_bounds() {
        let now = Utc::now();
        let synth = TradeSynthesizer::new(SynthConfig::default(), now);

        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let active = synth.active_trades(&mut rng);
            assert!((2..=4).contains(&active.len()));

            for (i, trade) in active.iter().enumerate() {
                assert_eq!(trade.id, format!("active_{i}"));
                let age = now - trade.entry_time;
                assert!(age >= Duration::hours(1) && age <= Duration::hours(ACTIVE_MAX_HOURS_AGO));
                assert!((75.0..95.0).contains(&trade.confidence));
                assert!(trade.entry > 0.0);
            }
        }
    }

    #[test]
    fn inverted_active_bounds_collapse_to_min() {
        let config = SynthConfig {
            active_min: 3,
            active_max: 1,
            ..SynthConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(2);
        let active = TradeSynthesizer::new(config, Utc::now()).active_trades(&mut rng);
        assert_eq!(active.len(), 3);
    }

    #[test]
    fn empty_historic_set_is_allowed() {
        let config = SynthConfig {
            historic_count: 0,
            ..SynthConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(2);
        assert!(TradeSynthesizer::new(config, Utc::now())
            .historic_trades(&mut rng)
            .is_empty());
    }
}
