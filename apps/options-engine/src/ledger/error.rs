//! Ledger errors.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{LifecycleError, PositionId};

/// Accounting failure. Invariant variants are fatal to the simulation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    /// Cash dropped below zero.
    #[error("Cash balance is negative: {cash}")]
    NegativeCash {
        /// Offending balance.
        cash: Decimal,
    },

    /// Reserved margin dropped below zero.
    #[error("Reserved margin is negative: {reserved}")]
    NegativeReserved {
        /// Offending balance.
        reserved: Decimal,
    },

    /// Unearned premium dropped below zero.
    #[error("Unearned premium is negative: {unearned}")]
    NegativeUnearned {
        /// Offending balance.
        unearned: Decimal,
    },

    /// Reserved margin differs from the margin held by open positions.
    #[error("Reserved margin {reserved} does not match open position margin {expected}")]
    ReservedMismatch {
        /// Ledger balance.
        reserved: Decimal,
        /// Sum over open positions.
        expected: Decimal,
    },

    /// Unearned premium differs from the credits received by open positions.
    #[error("Unearned premium {unearned} does not match open position credits {expected}")]
    UnearnedMismatch {
        /// Ledger balance.
        unearned: Decimal,
        /// Sum over open positions.
        expected: Decimal,
    },

    /// Cash plus reserved exceeds initial capital plus realized P&L.
    #[error("Capital exceeded: cash + reserved = {committed}, limit {limit}")]
    CapitalExceeded {
        /// Cash plus reserved.
        committed: Decimal,
        /// Initial capital plus realized P&L.
        limit: Decimal,
    },

    /// Cash plus reserved differs from capital plus realized P&L less open debits.
    #[error("Balance mismatch: cash + reserved = {actual}, expected {expected}")]
    BalanceMismatch {
        /// Cash plus reserved.
        actual: Decimal,
        /// Initial capital plus realized P&L minus debits paid on open positions.
        expected: Decimal,
    },

    /// Position id already present.
    #[error("Duplicate position id: {id}")]
    DuplicatePosition {
        /// Offending id.
        id: PositionId,
    },

    /// Admission would take cash below zero.
    #[error("Insufficient cash: required {required}, available {available}")]
    InsufficientCash {
        /// Cash needed for entry cost and margin.
        required: Decimal,
        /// Cash on hand.
        available: Decimal,
    },

    /// No open position with this id.
    #[error("Position not found: {id}")]
    PositionNotFound {
        /// Requested id.
        id: PositionId,
    },

    /// A money amount could not be represented.
    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount {
        /// Which amount.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Illegal lifecycle transition.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl LedgerError {
    /// Whether this error means the books no longer balance.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::NegativeCash { .. }
                | Self::NegativeReserved { .. }
                | Self::NegativeUnearned { .. }
                | Self::ReservedMismatch { .. }
                | Self::UnearnedMismatch { .. }
                | Self::CapitalExceeded { .. }
                | Self::BalanceMismatch { .. }
                | Self::DuplicatePosition { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invariant_classification() {
        assert!(LedgerError::NegativeCash { cash: dec!(-1) }.is_invariant_violation());
        assert!(
            LedgerError::BalanceMismatch {
                actual: dec!(1),
                expected: dec!(2)
            }
            .is_invariant_violation()
        );
        assert!(
            LedgerError::CapitalExceeded {
                committed: dec!(101200),
                limit: dec!(100000)
            }
            .is_invariant_violation()
        );
        assert!(
            !LedgerError::PositionNotFound {
                id: PositionId::new()
            }
            .is_invariant_violation()
        );
        assert!(
            !LedgerError::InsufficientCash {
                required: dec!(10),
                available: dec!(5)
            }
            .is_invariant_violation()
        );
    }
}
