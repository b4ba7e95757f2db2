//! Implied Volatility Solver
//!
//! Recovers Black-Scholes volatility from a quoted premium:
//! - Newton-Raphson from a Corrado-Miller initial guess near the money
//! - Bisection far from the money, or when Newton-Raphson stalls on small vega

#![allow(clippy::many_single_char_names)]
#![allow(clippy::suboptimal_flops)]

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::black_scholes::{bs_price, bs_vega};
use crate::domain::OptionType;

// ============================================================================
// Error Types
// ============================================================================

/// Why a premium could not be inverted.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IvError {
    /// Neither method settled within the iteration budget.
    #[error(
        "implied volatility did not converge in {iterations} iterations (residual {last_error:.6})"
    )]
    ConvergenceFailed {
        /// Iterations spent.
        iterations: u32,
        /// Price residual at the last iterate.
        last_error: f64,
    },

    /// Non-positive or non-finite query field.
    #[error("invalid IV query: {message}")]
    InvalidInput {
        /// Offending field.
        message: String,
    },

    /// The premium lies outside the range Black-Scholes can produce.
    #[error("premium not attainable: {reason}")]
    NoSolution {
        /// Bound that was violated.
        reason: String,
    },
}

// ============================================================================
// Configuration
// ============================================================================

/// Solver tolerances and volatility bracket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvSolverConfig {
    /// Iteration cap, applied to each method separately.
    pub max_iterations: u32,
    /// Stop once the price residual is below this.
    pub tolerance: f64,
    /// Lower end of the search bracket.
    pub min_vol: f64,
    /// Upper end of the search bracket.
    pub max_vol: f64,
    /// Use bisection when |ln(S/K)| exceeds this.
    pub hybrid_threshold: f64,
}

impl Default for IvSolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            min_vol: 0.001,
            max_vol: 5.0,
            hybrid_threshold: 0.20,
        }
    }
}

/// A premium to invert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IvQuery {
    /// Call or put.
    pub option_type: OptionType,
    /// Observed premium per share.
    pub market_price: f64,
    /// Underlying price.
    pub spot: f64,
    /// Strike price.
    pub strike: f64,
    /// Time to expiration in years.
    pub time: f64,
    /// Risk-free rate.
    pub rate: f64,
}

impl IvQuery {
    fn model_price(&self, sigma: f64) -> f64 {
        bs_price(self.option_type, self.spot, self.strike, self.time, self.rate, sigma)
    }

    fn vega(&self, sigma: f64) -> f64 {
        bs_vega(self.spot, self.strike, self.time, self.rate, sigma)
    }
}

// ============================================================================
// Solver
// ============================================================================

/// Inverts Black-Scholes for volatility.
#[derive(Debug, Clone, Default)]
pub struct IvSolver {
    config: IvSolverConfig,
}

impl IvSolver {
    /// Solver with explicit tolerances.
    #[must_use]
    pub const fn new(config: IvSolverConfig) -> Self {
        Self { config }
    }

    /// Compute implied volatility.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive inputs, a premium outside the attainable
    /// range, or failure to converge.
    pub fn solve(&self, query: &IvQuery) -> Result<f64, IvError> {
        Self::validate_inputs(query)?;

        let df = (-query.rate * query.time).exp();
        let intrinsic = match query.option_type {
            OptionType::Call => (query.spot - query.strike * df).max(0.0),
            OptionType::Put => (query.strike * df - query.spot).max(0.0),
        };
        if query.market_price < intrinsic - self.config.tolerance {
            return Err(IvError::NoSolution {
                reason: format!(
                    "Market price ({:.4}) is below intrinsic value ({intrinsic:.4})",
                    query.market_price
                ),
            });
        }

        let moneyness = (query.spot / query.strike).ln().abs();
        if moneyness > self.config.hybrid_threshold {
            return self.bisection(query);
        }

        let guess = self.corrado_miller_guess(query);
        self.newton_raphson(query, guess)
            .or_else(|_| self.bisection(query))
    }

    fn validate_inputs(query: &IvQuery) -> Result<(), IvError> {
        let checks = [
            ("Market price", query.market_price),
            ("Stock price", query.spot),
            ("Strike price", query.strike),
            ("Time to expiration", query.time),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(IvError::InvalidInput {
                    message: format!("{name} must be positive, got: {value}"),
                });
            }
        }
        Ok(())
    }

    /// Modified Corrado-Miller initial guess.
    fn corrado_miller_guess(&self, query: &IvQuery) -> f64 {
        let IvQuery {
            option_type,
            market_price,
            strike: k,
            time: t,
            rate: r,
            spot: s,
        } = *query;

        let f = s * (r * t).exp();
        let df = (-r * t).exp();

        let call_price = match option_type {
            OptionType::Call => market_price,
            OptionType::Put => market_price + df * (f - k),
        };

        let x = f - k;
        let y = call_price / df;
        if y <= 0.0 {
            return 0.30;
        }

        let numerator = y - 0.5 * x;
        let sqrt_term = numerator.powi(2) - (x.powi(2) / PI);
        if sqrt_term < 0.0 {
            return 0.30;
        }

        let sigma = (PI / (2.0 * t)).sqrt() * (numerator + sqrt_term.sqrt()) / f;
        sigma.clamp(self.config.min_vol, self.config.max_vol)
    }

    fn newton_raphson(&self, query: &IvQuery, initial_guess: f64) -> Result<f64, IvError> {
        let mut sigma = initial_guess.clamp(self.config.min_vol, self.config.max_vol);

        for i in 0..self.config.max_iterations {
            let error = query.model_price(sigma) - query.market_price;
            if error.abs() < self.config.tolerance {
                return Ok(sigma);
            }

            let vega = query.vega(sigma);
            if vega.abs() < 1e-12 {
                return Err(IvError::ConvergenceFailed {
                    iterations: i,
                    last_error: error.abs(),
                });
            }

            sigma = (sigma - error / vega).clamp(self.config.min_vol, self.config.max_vol);
        }

        Err(IvError::ConvergenceFailed {
            iterations: self.config.max_iterations,
            last_error: (query.model_price(sigma) - query.market_price).abs(),
        })
    }

    fn bisection(&self, query: &IvQuery) -> Result<f64, IvError> {
        let mut low = self.config.min_vol;
        let mut high = self.config.max_vol;

        let price_low = query.model_price(low);
        let price_high = query.model_price(high);
        if query.market_price < price_low {
            return Err(IvError::NoSolution {
                reason: format!(
                    "Market price ({:.4}) is below minimum theoretical price ({price_low:.4})",
                    query.market_price
                ),
            });
        }
        if query.market_price > price_high {
            return Err(IvError::NoSolution {
                reason: format!(
                    "Market price ({:.4}) exceeds maximum theoretical price ({price_high:.4})",
                    query.market_price
                ),
            });
        }

        let mut mid = low.midpoint(high);
        for _ in 0..self.config.max_iterations {
            mid = low.midpoint(high);
            let error = query.model_price(mid) - query.market_price;
            if error.abs() < self.config.tolerance {
                return Ok(mid);
            }
            if error > 0.0 {
                high = mid;
            } else {
                low = mid;
            }
        }

        let last_error = (query.model_price(mid) - query.market_price).abs();
        if last_error < self.config.tolerance * 100.0 {
            Ok(mid)
        } else {
            Err(IvError::ConvergenceFailed {
                iterations: self.config.max_iterations,
                last_error,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::black_scholes::{BsInputs, black_scholes};
    use test_case::test_case;

    fn premium(option_type: OptionType, spot: f64, strike: f64, vol: f64) -> f64 {
        black_scholes(&BsInputs {
            option_type,
            spot,
            strike,
            time: 0.25,
            rate: 0.05,
            volatility: vol,
        })
        .unwrap()
        .theoretical_price
    }

    #[test_case(OptionType::Call, 100.0, 0.20 ; "atm call")]
    #[test_case(OptionType::Put, 100.0, 0.35 ; "atm put")]
    #[test_case(OptionType::Call, 130.0, 0.25 ; "otm call bisection")]
    #[test_case(OptionType::Put, 75.0, 0.40 ; "otm put bisection")]
    fn test_recovers_volatility(kind: OptionType, strike: f64, vol: f64) {
        let query = IvQuery {
            option_type: kind,
            market_price: premium(kind, 100.0, strike, vol),
            spot: 100.0,
            strike,
            time: 0.25,
            rate: 0.05,
        };
        let solved = IvSolver::default().solve(&query).unwrap();
        assert!((solved - vol).abs() < 1e-4, "expected {vol}, got {solved}");
    }

    #[test]
    fn test_below_intrinsic() {
        let query = IvQuery {
            option_type: OptionType::Call,
            market_price: 5.0,
            spot: 120.0,
            strike: 100.0,
            time: 0.25,
            rate: 0.05,
        };
        assert!(matches!(
            IvSolver::default().solve(&query),
            Err(IvError::NoSolution { .. })
        ));
    }

    #[test]
    fn test_invalid_input() {
        let query = IvQuery {
            option_type: OptionType::Put,
            market_price: 1.0,
            spot: 100.0,
            strike: 100.0,
            time: 0.0,
            rate: 0.05,
        };
        assert!(matches!(
            IvSolver::default().solve(&query),
            Err(IvError::InvalidInput { .. })
        ));
    }
}
