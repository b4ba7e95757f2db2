//! Candidate strategies from an external selector.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;
use super::leg::Leg;
use super::strategy::{Strategy, StrategyKind};

/// Selector's own risk label for a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    /// Conservative.
    Low,
    /// Balanced.
    #[default]
    Medium,
    /// Aggressive.
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// A strategy suggestion annotated with the selector's reasoning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyProposal {
    /// Requested strategy kind.
    pub kind: StrategyKind,
    /// Proposed legs.
    pub legs: Vec<Leg>,
    /// Free-text reasoning.
    #[serde(default)]
    pub rationale: String,
    /// Selector confidence in [0, 1].
    pub confidence: f64,
    /// Selector risk label.
    #[serde(default)]
    pub risk_level: RiskLevel,
}

impl StrategyProposal {
    /// Validate the annotation and build the strategy.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidProposal` when confidence is outside [0, 1],
    /// or the template error when the legs do not form `kind`.
    pub fn into_strategy(self) -> Result<Strategy, ValidationError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ValidationError::InvalidProposal {
                message: format!("confidence must be within [0, 1], got {}", self.confidence),
            });
        }
        Strategy::from_legs(self.kind, self.legs)
    }
}
