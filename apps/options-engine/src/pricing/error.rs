//! Pricing errors.

use thiserror::Error;

/// Inputs for which Black-Scholes is undefined.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PricingError {
    /// Volatility must be positive and finite.
    #[error("Invalid volatility for strike {strike}: {volatility}")]
    InvalidVolatility {
        /// Strike being priced.
        strike: f64,
        /// Offending volatility.
        volatility: f64,
    },

    /// Underlying price must be positive and finite.
    #[error("Invalid underlying price: {price}")]
    InvalidUnderlying {
        /// Offending price.
        price: f64,
    },

    /// Strike must be positive and finite.
    #[error("Invalid strike: {strike}")]
    InvalidStrike {
        /// Offending strike.
        strike: f64,
    },

    /// Rate or time is not a finite number.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message.
        message: String,
    },
}
