//! Risk-neutral lognormal terminal distribution.
//!
//! S_T = S · exp((r − σ²/2)·T + σ·√T·Z), Z ~ N(0, 1).

// Financial formulas use standard notation where mul_add() obscures meaning
#![allow(clippy::suboptimal_flops)]

use crate::domain::{CONTRACT_MULTIPLIER, OptionType, Strategy};
use crate::pricing::black_scholes::d1_d2;
use crate::pricing::norm_cdf;

/// Terminal price distribution over a horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lognormal {
    /// Current underlying price.
    pub spot: f64,
    /// Drift (risk-free rate).
    pub rate: f64,
    /// Annualized volatility.
    pub volatility: f64,
    /// Horizon in years.
    pub time: f64,
}

impl Lognormal {
    /// Whether the horizon has already elapsed, so S_T = S.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.time <= 0.0
    }

    /// Mean of ln(S_T / S).
    #[must_use]
    pub fn log_drift(&self) -> f64 {
        (self.rate - 0.5 * self.volatility * self.volatility) * self.time
    }

    /// Standard deviation of ln(S_T / S).
    #[must_use]
    pub fn log_stdev(&self) -> f64 {
        self.volatility * self.time.max(0.0).sqrt()
    }

    /// Terminal price for a standard normal draw.
    #[must_use]
    pub fn terminal(&self, z: f64) -> f64 {
        if self.is_degenerate() {
            return self.spot;
        }
        self.spot * (self.log_drift() + self.log_stdev() * z).exp()
    }

    /// P(S_T ≤ x).
    #[must_use]
    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if x.is_infinite() {
            return 1.0;
        }
        if self.is_degenerate() {
            return if self.spot <= x { 1.0 } else { 0.0 };
        }
        norm_cdf(((x / self.spot).ln() - self.log_drift()) / self.log_stdev())
    }

    /// E[intrinsic value at T] for one option, undiscounted.
    #[must_use]
    pub fn expected_intrinsic(&self, option_type: OptionType, strike: f64) -> f64 {
        if self.is_degenerate() {
            return option_type.intrinsic(self.spot, strike);
        }
        let (d1, d2) = d1_d2(self.spot, strike, self.time, self.rate, self.volatility);
        let forward = self.spot * (self.rate * self.time).exp();
        match option_type {
            OptionType::Call => forward * norm_cdf(d1) - strike * norm_cdf(d2),
            OptionType::Put => strike * norm_cdf(-d2) - forward * norm_cdf(-d1),
        }
    }
}

/// Probability that the payoff at expiration is strictly positive.
///
/// The breakevens split (0, ∞) into intervals of constant payoff sign; the
/// probability mass of each profitable interval is summed.
#[must_use]
pub fn probability_of_profit(strategy: &Strategy, breakevens: &[f64], dist: &Lognormal) -> f64 {
    if dist.is_degenerate() {
        return if strategy.payoff(dist.spot) > 0.0 { 1.0 } else { 0.0 };
    }

    let mut edges = Vec::with_capacity(breakevens.len() + 2);
    edges.push(0.0);
    edges.extend(breakevens.iter().copied().filter(|b| *b > 0.0));
    edges.push(f64::INFINITY);

    edges
        .windows(2)
        .filter(|w| {
            let inside = if w[1].is_infinite() {
                w[0] * 2.0 + 1.0
            } else {
                w[0].midpoint(w[1])
            };
            strategy.payoff(inside) > 0.0
        })
        .map(|w| dist.cdf(w[1]) - dist.cdf(w[0]))
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Closed-form expected payoff per unit under the lognormal model.
#[must_use]
pub fn analytic_expected_value(strategy: &Strategy, dist: &Lognormal) -> f64 {
    strategy
        .legs()
        .iter()
        .map(|leg| {
            let contract = leg.contract();
            let expected = dist.expected_intrinsic(contract.option_type(), contract.strike());
            leg.signed_quantity() * CONTRACT_MULTIPLIER * (expected - contract.premium())
        })
        .sum()
}
