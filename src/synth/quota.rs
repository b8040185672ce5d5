//! Win-quota planning
//!
//! Outcomes are decided before any price is drawn. A running quota forces
//! wins once the remaining trades can only just cover the wins still
//! owed, and forces losses once the quota is met, so the realized win
//! count always equals `round(count * rate)`.

use rand::Rng;

/// Chance of taking a win while the quota is still open but not forced
pub const DISCRETIONARY_WIN_PROB: f64 = 0.7;

/// Number of wins a set of `count` trades must contain
pub fn win_quota(count: usize, target_rate: f64) -> usize {
    let rate = if target_rate.is_finite() {
        target_rate.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((count as f64 * rate).round() as usize).min(count)
}

/// Fold state carried across trade indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    pub wins: usize,
    pub remaining_needed: usize,
}

impl QuotaState {
    pub fn new(quota: usize) -> Self {
        Self {
            wins: 0,
            remaining_needed: quota,
        }
    }

    /// Decide the next outcome with `remaining_trades` still to generate
    /// (including this one). Returns the advanced state and the outcome.
    pub fn step<R: Rng + ?Sized>(self, remaining_trades: usize, rng: &mut R) -> (Self, bool) {
        let win = self.remaining_needed > 0
            && (self.remaining_needed >= remaining_trades
                || rng.gen_bool(DISCRETIONARY_WIN_PROB));

        if win {
            (
                Self {
                    wins: self.wins + 1,
                    remaining_needed: self.remaining_needed - 1,
                },
                true,
            )
        } else {
            (self, false)
        }
    }
}

/// One outcome per trade index; `true` is a win
pub fn plan_outcomes<R: Rng + ?Sized>(count: usize, target_rate: f64, rng: &mut R) -> Vec<bool> {
    let start = QuotaState::new(win_quota(count, target_rate));

    (0..count)
        .scan(start, |state, i| {
            let (next, win) = state.step(count - i, rng);
            *state = next;
            Some(win)
        })
        .collect()
}
