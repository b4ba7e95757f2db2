//! Strategy Selector Port (Driven Port)
//!
//! Interface for the collaborator that proposes candidate strategies.

use async_trait::async_trait;

use crate::domain::{MarketSnapshot, OptionChain, StrategyProposal};

/// Selector error. The decision loop treats any error as "no proposal".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector could not be reached.
    #[error("Strategy selector unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// The selector answered with something unusable.
    #[error("Invalid selector response: {message}")]
    InvalidResponse {
        /// Error details.
        message: String,
    },

    /// The request did not complete in time.
    #[error("Strategy selector timed out after {timeout_ms} ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },
}

/// Port for requesting a candidate strategy.
#[async_trait]
pub trait StrategySelectorPort: Send + Sync {
    /// Propose a strategy for the current market, or `None` to stand aside.
    async fn propose(
        &self,
        snapshot: &MarketSnapshot,
        chain: Option<&OptionChain>,
    ) -> Result<Option<StrategyProposal>, SelectorError>;
}
