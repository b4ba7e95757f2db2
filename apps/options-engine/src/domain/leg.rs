//! Strategy legs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::contract::{CONTRACT_MULTIPLIER, OptionContract};
use super::errors::ValidationError;

/// Direction of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegDirection {
    /// Bought (pay premium).
    Long,
    /// Sold (receive premium).
    Short,
}

impl LegDirection {
    /// +1 for long, -1 for short.
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }

    /// The other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl fmt::Display for LegDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// One contract position inside a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LegFields")]
pub struct Leg {
    contract: OptionContract,
    direction: LegDirection,
    quantity: u32,
}

#[derive(Deserialize)]
struct LegFields {
    contract: OptionContract,
    direction: LegDirection,
    quantity: u32,
}

impl TryFrom<LegFields> for Leg {
    type Error = ValidationError;

    fn try_from(f: LegFields) -> Result<Self, Self::Error> {
        Self::new(f.contract, f.direction, f.quantity)
    }
}

impl Leg {
    /// Create a leg.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidQuantity` if `quantity` is zero.
    pub fn new(
        contract: OptionContract,
        direction: LegDirection,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity { quantity });
        }
        Ok(Self {
            contract,
            direction,
            quantity,
        })
    }

    /// Long leg of one contract.
    #[must_use]
    pub const fn long(contract: OptionContract) -> Self {
        Self {
            contract,
            direction: LegDirection::Long,
            quantity: 1,
        }
    }

    /// Short leg of one contract.
    #[must_use]
    pub const fn short(contract: OptionContract) -> Self {
        Self {
            contract,
            direction: LegDirection::Short,
            quantity: 1,
        }
    }

    /// The contract.
    #[must_use]
    pub const fn contract(&self) -> &OptionContract {
        &self.contract
    }

    /// Leg direction.
    #[must_use]
    pub const fn direction(&self) -> LegDirection {
        self.direction
    }

    /// Number of contracts.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Strike shortcut.
    #[must_use]
    pub const fn strike(&self) -> f64 {
        self.contract.strike()
    }

    /// Direction sign times quantity.
    #[must_use]
    pub fn signed_quantity(&self) -> f64 {
        self.direction.sign() * f64::from(self.quantity)
    }

    /// Cash paid to open this leg (negative when premium is received).
    #[must_use]
    pub fn entry_cost(&self) -> f64 {
        self.signed_quantity() * CONTRACT_MULTIPLIER * self.contract.premium()
    }

    /// Liquidation value of this leg for a per-share option price.
    #[must_use]
    pub fn value_at_price(&self, option_price: f64) -> f64 {
        self.signed_quantity() * CONTRACT_MULTIPLIER * option_price
    }

    /// P&L at expiration for a terminal underlying price.
    #[must_use]
    pub fn payoff(&self, spot: f64) -> f64 {
        self.signed_quantity()
            * CONTRACT_MULTIPLIER
            * (self.contract.intrinsic(spot) - self.contract.premium())
    }
}
