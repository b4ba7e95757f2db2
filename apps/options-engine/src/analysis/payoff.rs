//! Expiration payoff geometry.
//!
//! The payoff of any leg combination is piecewise linear in the terminal price,
//! with kinks only at strikes. Extremes and roots are therefore found exactly by
//! evaluating the breakpoints, S = 0, and the slope beyond the highest strike.

use serde::{Deserialize, Serialize};

use crate::domain::Strategy;

/// Numerical slack for slope and root comparisons.
const EPSILON: f64 = 1e-9;

/// A profit or loss extreme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bound {
    /// Finite amount in account currency.
    Finite(f64),
    /// Grows without limit as the underlying rises.
    Unbounded,
}

impl Bound {
    /// The amount when finite.
    #[must_use]
    pub const fn finite(self) -> Option<f64> {
        match self {
            Self::Finite(v) => Some(v),
            Self::Unbounded => None,
        }
    }

    /// Whether the extreme is unbounded.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

/// P&L at one underlying price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PnlPoint {
    /// Terminal underlying price.
    pub price: f64,
    /// Payoff at expiration.
    pub pnl: f64,
}

/// Sorted distinct strikes.
#[must_use]
pub fn breakpoints(strategy: &Strategy) -> Vec<f64> {
    strategy.strikes()
}

/// Evaluation points: S = 0 followed by the breakpoints.
fn nodes(strategy: &Strategy) -> Vec<f64> {
    let mut nodes = vec![0.0];
    nodes.extend(breakpoints(strategy).into_iter().filter(|k| *k > 0.0));
    nodes
}

/// Largest payoff per unit, or unbounded when the upper slope is positive.
#[must_use]
pub fn max_profit(strategy: &Strategy) -> Bound {
    if strategy.upper_slope() > EPSILON {
        return Bound::Unbounded;
    }
    let best = nodes(strategy)
        .into_iter()
        .map(|s| strategy.payoff(s))
        .fold(f64::NEG_INFINITY, f64::max);
    Bound::Finite(best)
}

/// Largest loss per unit as a positive magnitude, or unbounded when the upper
/// slope is negative.
#[must_use]
pub fn max_loss(strategy: &Strategy) -> Bound {
    if strategy.upper_slope() < -EPSILON {
        return Bound::Unbounded;
    }
    let worst = nodes(strategy)
        .into_iter()
        .map(|s| strategy.payoff(s))
        .fold(f64::INFINITY, f64::min);
    Bound::Finite(-worst)
}

/// Terminal prices where the payoff crosses or touches zero, ascending.
#[must_use]
pub fn breakevens(strategy: &Strategy) -> Vec<f64> {
    let nodes = nodes(strategy);
    let mut roots = Vec::new();

    for pair in nodes.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let (fa, fb) = (strategy.payoff(a), strategy.payoff(b));
        if fa == 0.0 && a > 0.0 {
            roots.push(a);
        }
        if fa * fb < 0.0 {
            roots.push(a - fa * (b - a) / (fb - fa));
        }
    }

    if let Some(&last) = nodes.last() {
        let f_last = strategy.payoff(last);
        let slope = strategy.upper_slope();
        if f_last == 0.0 && last > 0.0 {
            roots.push(last);
        } else if slope.abs() > EPSILON && f_last * slope < 0.0 {
            roots.push(last - f_last / slope);
        }
    }

    roots.sort_by(f64::total_cmp);
    roots.dedup_by(|a, b| (*a - *b).abs() < EPSILON);
    roots
}

/// Payoff sampled at `points` evenly spaced prices across spot × (1 ± `range`).
#[must_use]
pub fn pnl_curve(strategy: &Strategy, spot: f64, range: f64, points: usize) -> Vec<PnlPoint> {
    let low = (spot * (1.0 - range)).max(0.0);
    let high = spot * (1.0 + range);
    match points {
        0 => Vec::new(),
        1 => vec![PnlPoint {
            price: spot,
            pnl: strategy.payoff(spot),
        }],
        n => {
            let step = (high - low) / (n - 1) as f64;
            (0..n)
                .map(|i| {
                    let price = low + step * i as f64;
                    PnlPoint {
                        price,
                        pnl: strategy.payoff(price),
                    }
                })
                .collect()
        }
    }
}
