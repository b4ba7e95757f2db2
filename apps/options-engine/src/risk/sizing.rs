//! Risk-based position sizing.
//!
//! ```text
//! quantity = floor(min(equity × risk_per_trade / max_loss_per_unit,
//!                      available_cash / cash_per_unit))
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use options_engine::risk::{PositionSizer, SizingInput};
//! use rust_decimal_macros::dec;
//!
//! let sizer = PositionSizer::new(dec!(0.02));
//! let result = sizer.size(&SizingInput {
//!     equity: dec!(10000),
//!     available_cash: dec!(10000),
//!     max_loss_per_unit: dec!(100),
//!     cash_per_unit: dec!(100),
//! })?;
//! assert_eq!(result.quantity, 2);
//! ```

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inputs for one sizing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingInput {
    /// Portfolio equity.
    pub equity: Decimal,
    /// Unreserved cash.
    pub available_cash: Decimal,
    /// Loss per unit at the worst terminal price.
    pub max_loss_per_unit: Decimal,
    /// Cash consumed per unit at admission.
    pub cash_per_unit: Decimal,
}

/// Sizing outcome with both limits for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Units to admit.
    pub quantity: u32,
    /// Units allowed by the per-trade risk budget.
    pub risk_limit: u32,
    /// Units the available cash can fund.
    pub cash_limit: u32,
}

/// Sizing failure.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SizingError {
    /// Max loss per unit must be positive.
    #[error("Max loss per unit must be positive, got {max_loss}")]
    NonPositiveRisk {
        /// Offending max loss.
        max_loss: Decimal,
    },
    /// Neither budget funds a single unit.
    #[error("Insufficient capital: risk budget allows {risk_limit}, cash allows {cash_limit}")]
    InsufficientCapital {
        /// Units allowed by the risk budget.
        risk_limit: u32,
        /// Units the cash can fund.
        cash_limit: u32,
    },
}

/// Sizes positions so that max loss stays within a fixed share of equity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSizer {
    risk_per_trade: Decimal,
}

impl PositionSizer {
    /// Sizer risking `risk_per_trade` of equity per position.
    #[must_use]
    pub const fn new(risk_per_trade: Decimal) -> Self {
        Self { risk_per_trade }
    }

    /// Fraction of equity risked per position.
    #[must_use]
    pub const fn risk_per_trade(&self) -> Decimal {
        self.risk_per_trade
    }

    /// Size one position.
    ///
    /// # Errors
    ///
    /// `NonPositiveRisk` when the max loss is not positive; `InsufficientCapital`
    /// when the result rounds down to zero units.
    pub fn size(&self, input: &SizingInput) -> Result<SizingResult, SizingError> {
        if input.max_loss_per_unit <= Decimal::ZERO {
            return Err(SizingError::NonPositiveRisk {
                max_loss: input.max_loss_per_unit,
            });
        }

        let budget = (input.equity * self.risk_per_trade).max(Decimal::ZERO);
        let risk_limit = units(budget / input.max_loss_per_unit);
        let cash_limit = if input.cash_per_unit > Decimal::ZERO {
            units(input.available_cash.max(Decimal::ZERO) / input.cash_per_unit)
        } else {
            u32::MAX
        };

        let quantity = risk_limit.min(cash_limit);
        if quantity < 1 {
            return Err(SizingError::InsufficientCapital {
                risk_limit,
                cash_limit,
            });
        }
        Ok(SizingResult {
            quantity,
            risk_limit,
            cash_limit,
        })
    }
}

fn units(ratio: Decimal) -> u32 {
    ratio.floor().to_u32().unwrap_or(u32::MAX)
}
