//! Options pricing module.
//!
//! Closed-form European Black-Scholes pricing, Greeks, and an implied
//! volatility solver. Everything here is pure and thread-safe.

pub mod black_scholes;
pub mod error;
pub mod greeks;
pub mod iv;

pub use black_scholes::{
    BsInputs, OptionQuote, StrategyQuote, black_scholes, price, price_strategy,
};
pub use error::PricingError;
pub use greeks::Greeks;
pub use iv::{IvError, IvQuery, IvSolver, IvSolverConfig};

/// Standard normal CDF.
#[must_use]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
}

/// Standard normal PDF.
#[must_use]
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_cdf_symmetry() {
        for x in [0.1, 0.5, 1.0, 2.5] {
            assert!((norm_cdf(x) + norm_cdf(-x) - 1.0).abs() < 1e-15);
        }
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-15);
        assert!((norm_cdf(1.96) - 0.975_002).abs() < 1e-6);
    }

    #[test]
    fn test_norm_pdf_peak() {
        assert!((norm_pdf(0.0) - 0.398_942_280_4).abs() < 1e-10);
    }
}
