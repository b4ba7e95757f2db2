//! Domain errors for contracts, strategies, proposals and position lifecycle.

use thiserror::Error;

use super::position::PositionState;
use super::strategy::StrategyKind;

/// Structural validation failure.
///
/// Raised at construction time; nothing is mutated when one of these is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// Contract fields out of range.
    #[error("Invalid contract: {message}")]
    InvalidContract {
        /// Error message.
        message: String,
    },

    /// Leg quantity must be at least one.
    #[error("Leg quantity must be at least 1, got {quantity}")]
    InvalidQuantity {
        /// Offending quantity.
        quantity: u32,
    },

    /// Wrong number of legs for the strategy kind.
    #[error("{kind} requires {expected} legs, got {actual}")]
    LegCount {
        /// Strategy kind being built.
        kind: StrategyKind,
        /// Required leg count.
        expected: usize,
        /// Supplied leg count.
        actual: usize,
    },

    /// Leg types or directions do not match the strategy template.
    #[error("{kind} leg template mismatch: {message}")]
    LegTemplate {
        /// Strategy kind being built.
        kind: StrategyKind,
        /// Error message.
        message: String,
    },

    /// Strikes are not in the order the strategy requires.
    #[error("{kind} strike ordering violated: {message}")]
    StrikeOrdering {
        /// Strategy kind being built.
        kind: StrategyKind,
        /// Error message.
        message: String,
    },

    /// Leg quantities are not in the ratio the strategy requires.
    #[error("{kind} quantity mismatch: {message}")]
    QuantityMismatch {
        /// Strategy kind being built.
        kind: StrategyKind,
        /// Error message.
        message: String,
    },

    /// Legs reference different underlyings or expirations.
    #[error("Legs must share one underlying and one expiration: {message}")]
    MixedLegs {
        /// Error message.
        message: String,
    },

    /// The underlying price is outside the range the strategy requires.
    #[error("{kind} requires {message}, underlying is {spot:.2}")]
    UnderlyingOutOfRange {
        /// Strategy kind being checked.
        kind: StrategyKind,
        /// Underlying price at the check.
        spot: f64,
        /// Required range.
        message: String,
    },

    /// Strategy already expired at the snapshot time.
    #[error("Strategy expired on {expiration}")]
    Expired {
        /// Expiration date.
        expiration: chrono::NaiveDate,
    },

    /// Volatility smile points out of range.
    #[error("Invalid volatility smile: {message}")]
    InvalidSmile {
        /// Error message.
        message: String,
    },

    /// Strategy proposal failed validation.
    #[error("Invalid proposal: {message}")]
    InvalidProposal {
        /// Error message.
        message: String,
    },
}

/// Illegal position lifecycle transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// Transition not permitted by the lifecycle state machine.
    #[error("Invalid position state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: PositionState,
        /// Requested state.
        to: PositionState,
    },
}
