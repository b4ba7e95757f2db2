//! What the decision loop receives for one simulated day.

use serde::{Deserialize, Serialize};

use crate::domain::{MarketSnapshot, StrategyProposal};

/// Source of the day's market snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketInput {
    /// Evolve the last snapshot with the price model.
    Simulated,
    /// Snapshot observed by the market data feed; takes precedence over the model.
    Observed {
        /// The observed snapshot.
        snapshot: MarketSnapshot,
    },
    /// Feed failed or timed out; the model fills in and the day is degraded.
    Unavailable {
        /// Failure description.
        reason: String,
    },
}

/// One day's input to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayInput {
    /// Market snapshot source.
    pub market: MarketInput,
    /// Candidate strategy for admission, if any.
    #[serde(default)]
    pub proposal: Option<StrategyProposal>,
}

impl DayInput {
    /// Model-driven day with no proposal.
    #[must_use]
    pub const fn simulated() -> Self {
        Self {
            market: MarketInput::Simulated,
            proposal: None,
        }
    }

    /// Day driven by an observed snapshot.
    #[must_use]
    pub const fn observed(snapshot: MarketSnapshot) -> Self {
        Self {
            market: MarketInput::Observed { snapshot },
            proposal: None,
        }
    }

    /// Day whose snapshot could not be fetched.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            market: MarketInput::Unavailable {
                reason: reason.into(),
            },
            proposal: None,
        }
    }

    /// Attach a proposal.
    #[must_use]
    pub fn with_proposal(mut self, proposal: Option<StrategyProposal>) -> Self {
        self.proposal = proposal;
        self
    }
}
