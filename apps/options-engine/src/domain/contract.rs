//! Option contract value type.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Shares per contract. Applied everywhere P&L is computed.
pub const CONTRACT_MULTIPLIER: f64 = 100.0;

const SECONDS_PER_YEAR: f64 = 365.0 * 86_400.0;

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionType {
    /// Call option (right to buy).
    Call,
    /// Put option (right to sell).
    Put,
}

impl OptionType {
    /// Value at expiration per share.
    #[must_use]
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }

    /// Slope of the intrinsic value above the strike.
    #[must_use]
    pub const fn upper_slope(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => 0.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// A single European option contract as quoted.
///
/// Immutable once created; construction validates every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContractFields")]
pub struct OptionContract {
    symbol: String,
    strike: f64,
    expiration: NaiveDate,
    option_type: OptionType,
    premium: f64,
    implied_volatility: f64,
}

#[derive(Deserialize)]
struct ContractFields {
    symbol: String,
    strike: f64,
    expiration: NaiveDate,
    option_type: OptionType,
    premium: f64,
    implied_volatility: f64,
}

impl TryFrom<ContractFields> for OptionContract {
    type Error = ValidationError;

    fn try_from(f: ContractFields) -> Result<Self, Self::Error> {
        Self::new(
            f.symbol,
            f.strike,
            f.expiration,
            f.option_type,
            f.premium,
            f.implied_volatility,
        )
    }
}

impl OptionContract {
    /// Create a validated contract.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidContract` when the symbol is empty, the strike is
    /// not positive, the premium is negative, or the implied volatility is not positive.
    pub fn new(
        symbol: impl Into<String>,
        strike: f64,
        expiration: NaiveDate,
        option_type: OptionType,
        premium: f64,
        implied_volatility: f64,
    ) -> Result<Self, ValidationError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(ValidationError::InvalidContract {
                message: "symbol must not be empty".to_string(),
            });
        }
        if !strike.is_finite() || strike <= 0.0 {
            return Err(ValidationError::InvalidContract {
                message: format!("strike must be positive, got: {strike}"),
            });
        }
        if !premium.is_finite() || premium < 0.0 {
            return Err(ValidationError::InvalidContract {
                message: format!("premium must be non-negative, got: {premium}"),
            });
        }
        if !implied_volatility.is_finite() || implied_volatility <= 0.0 {
            return Err(ValidationError::InvalidContract {
                message: format!("implied volatility must be positive, got: {implied_volatility}"),
            });
        }

        Ok(Self {
            symbol,
            strike,
            expiration,
            option_type,
            premium,
            implied_volatility,
        })
    }

    /// Underlying symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Strike price.
    #[must_use]
    pub const fn strike(&self) -> f64 {
        self.strike
    }

    /// Expiration date.
    #[must_use]
    pub const fn expiration(&self) -> NaiveDate {
        self.expiration
    }

    /// Call or put.
    #[must_use]
    pub const fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// Quoted premium per share.
    #[must_use]
    pub const fn premium(&self) -> f64 {
        self.premium
    }

    /// Implied volatility at quote time.
    #[must_use]
    pub const fn implied_volatility(&self) -> f64 {
        self.implied_volatility
    }

    /// Intrinsic value per share at the given underlying price.
    #[must_use]
    pub fn intrinsic(&self, spot: f64) -> f64 {
        self.option_type.intrinsic(spot, self.strike)
    }

    /// Year fraction (ACT/365) from `at` until expiration at 00:00 UTC.
    ///
    /// Negative once expiration has passed.
    #[must_use]
    pub fn years_to_expiry(&self, at: DateTime<Utc>) -> f64 {
        years_between(at, self.expiration)
    }
}

/// Year fraction (ACT/365) from `at` until `expiration` at 00:00 UTC.
#[must_use]
pub fn years_between(at: DateTime<Utc>, expiration: NaiveDate) -> f64 {
    let expiry = expiration.and_time(chrono::NaiveTime::MIN).and_utc();
    (expiry - at).num_seconds() as f64 / SECONDS_PER_YEAR
}
