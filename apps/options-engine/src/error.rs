//! Crate-level error type.
//!
//! Module errors convert into `EngineError`, which carries a stable
//! `ErrorCode` for callers that branch on the failure class.
//!
//! | Code | Fatal | Usage |
//! |------|-------|-------|
//! | `VALIDATION` | no | Malformed strategy or proposal |
//! | `PRICING` | no | Invalid pricing inputs |
//! | `DATA_UNAVAILABLE` | no | Market data fetch failed or timed out |
//! | `INSUFFICIENT_CAPITAL` | no | Sizing produced zero units |
//! | `POSITION_LIMIT_EXCEEDED` | no | Open position cap reached |
//! | `LEDGER_INVARIANT` | yes | Portfolio books no longer balance |
//! | `HALTED` | yes | Engine refuses work until reset |
//! | `NOT_FOUND` | no | Unknown position id |
//! | `CONFIG` | no | Configuration could not be loaded |
//! | `INTERNAL` | no | Unexpected failure |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::{MarketDataError, SelectorError};
use crate::config::ConfigError;
use crate::domain::{LifecycleError, ValidationError};
use crate::ledger::LedgerError;
use crate::pricing::PricingError;
use crate::risk::RejectionReason;

/// Failure class of an `EngineError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed strategy or proposal.
    Validation,
    /// Invalid pricing inputs.
    Pricing,
    /// External market data missing.
    DataUnavailable,
    /// Not enough capital for one unit.
    InsufficientCapital,
    /// Open position cap reached.
    PositionLimitExceeded,
    /// Ledger invariant violated.
    LedgerInvariant,
    /// Engine halted after an invariant violation.
    Halted,
    /// Unknown entity.
    NotFound,
    /// Configuration error.
    Config,
    /// Anything else.
    Internal,
}

impl ErrorCode {
    /// Stable reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Pricing => "PRICING",
            Self::DataUnavailable => "DATA_UNAVAILABLE",
            Self::InsufficientCapital => "INSUFFICIENT_CAPITAL",
            Self::PositionLimitExceeded => "POSITION_LIMIT_EXCEEDED",
            Self::LedgerInvariant => "LEDGER_INVARIANT",
            Self::Halted => "HALTED",
            Self::NotFound => "NOT_FOUND",
            Self::Config => "CONFIG",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether the engine must be reset before doing more work.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::LedgerInvariant | Self::Halted)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// An engine error with code, message and key-value context.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct EngineError {
    code: ErrorCode,
    message: String,
    context: Vec<(String, String)>,
}

impl EngineError {
    /// Create a new error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Add context to the error.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }

    /// Error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Context pairs.
    #[must_use]
    pub fn context(&self) -> &[(String, String)] {
        &self.context
    }

    /// Shorthand for `code().is_fatal()`.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }

    /// Engine refuses work until reset.
    #[must_use]
    pub fn halted(cause: &str) -> Self {
        Self::new(ErrorCode::Halted, "engine halted; reset required").with_context("cause", cause)
    }

    /// Position id not in the book.
    #[must_use]
    pub fn position_not_found(id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Position {id} not found"))
            .with_context("position_id", id)
    }

    /// Internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

impl From<ValidationError> for EngineError {
    fn from(e: ValidationError) -> Self {
        Self::new(ErrorCode::Validation, e.to_string())
    }
}

impl From<PricingError> for EngineError {
    fn from(e: PricingError) -> Self {
        Self::new(ErrorCode::Pricing, e.to_string())
    }
}

impl From<LifecycleError> for EngineError {
    fn from(e: LifecycleError) -> Self {
        Self::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<LedgerError> for EngineError {
    fn from(e: LedgerError) -> Self {
        let code = match &e {
            _ if e.is_invariant_violation() => ErrorCode::LedgerInvariant,
            LedgerError::PositionNotFound { .. } => ErrorCode::NotFound,
            LedgerError::InsufficientCash { .. } => ErrorCode::InsufficientCapital,
            _ => ErrorCode::Internal,
        };
        Self::new(code, e.to_string())
    }
}

impl From<RejectionReason> for EngineError {
    fn from(reason: RejectionReason) -> Self {
        let code = match &reason {
            RejectionReason::InsufficientCapital { .. } | RejectionReason::NonPositiveRisk { .. } => {
                ErrorCode::InsufficientCapital
            }
            RejectionReason::PositionLimitExceeded { .. } => ErrorCode::PositionLimitExceeded,
            RejectionReason::Pricing { .. } => ErrorCode::Pricing,
            RejectionReason::Validation { .. }
            | RejectionReason::DuplicateUnderlying { .. }
            | RejectionReason::OutsideEntryWindow { .. }
            | RejectionReason::LowConfidence { .. } => ErrorCode::Validation,
        };
        Self::new(code, reason.to_string()).with_context("reason", reason.as_str())
    }
}

impl From<MarketDataError> for EngineError {
    fn from(e: MarketDataError) -> Self {
        Self::new(ErrorCode::DataUnavailable, e.to_string())
    }
}

impl From<SelectorError> for EngineError {
    fn from(e: SelectorError) -> Self {
        Self::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        Self::new(ErrorCode::Config, e.to_string())
    }
}
