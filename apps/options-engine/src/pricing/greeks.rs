//! Option sensitivities.

use serde::{Deserialize, Serialize};

/// First-order Greeks plus gamma, per share.
///
/// Theta is per calendar day, vega per volatility point, rho per rate point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Greeks {
    /// dV/dS.
    pub delta: f64,
    /// d²V/dS².
    pub gamma: f64,
    /// dV/dt per day.
    pub theta: f64,
    /// dV/dσ per 1% move.
    pub vega: f64,
    /// dV/dr per 1% move.
    pub rho: f64,
}

impl Greeks {
    /// All zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            delta: 0.0,
            gamma: 0.0,
            theta: 0.0,
            vega: 0.0,
            rho: 0.0,
        }
    }

    /// Multiply every Greek by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            theta: self.theta * factor,
            vega: self.vega * factor,
            rho: self.rho * factor,
        }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
            theta: self.theta + other.theta,
            vega: self.vega + other.vega,
            rho: self.rho + other.rho,
        }
    }
}

impl std::iter::Sum for Greeks {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Self::add)
    }
}
