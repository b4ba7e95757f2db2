//! Admission control.
//!
//! The risk manager owns the `Portfolio`. A strategy is admitted only after
//! every check passes; a rejection leaves the portfolio untouched.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::sizing::{PositionSizer, SizingError, SizingInput};
use crate::analysis::{Bound, max_loss, max_profit};
use crate::config::{EntryWindow, RiskConfig, SimulationConfig};
use crate::domain::{
    CONTRACT_MULTIPLIER, MarketSnapshot, Position, PositionId, RiskProfile, Strategy,
    StrategyKind, StrategyProposal,
};
use crate::ledger::{ExitReason, LedgerError, Portfolio, TradeRecord, to_money};
use crate::observability;
use crate::pricing::price_strategy;

/// Why a strategy was not admitted.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// Sizing produced zero units.
    #[error("Insufficient capital: risk budget allows {risk_limit} units, cash allows {cash_limit}")]
    InsufficientCapital {
        /// Units allowed by the risk budget.
        risk_limit: u32,
        /// Units the cash can fund.
        cash_limit: u32,
    },

    /// Open position cap reached.
    #[error("Position limit exceeded: {open} open, max {max}")]
    PositionLimitExceeded {
        /// Currently open.
        open: usize,
        /// Configured cap.
        max: usize,
    },

    /// Structural or snapshot validation failed.
    #[error("Validation failed: {message}")]
    Validation {
        /// Validation message.
        message: String,
    },

    /// A leg could not be priced.
    #[error("Pricing failed: {message}")]
    Pricing {
        /// Pricing message.
        message: String,
    },

    /// Another position on this underlying is open.
    #[error("Position already open on {symbol}")]
    DuplicateUnderlying {
        /// Underlying symbol.
        symbol: String,
    },

    /// The strategy cannot lose money, so it cannot be sized.
    #[error("Max loss per unit must be positive, got {max_loss}")]
    NonPositiveRisk {
        /// Computed max loss.
        max_loss: f64,
    },

    /// Days to expiry outside the entry window for this kind.
    #[error("{kind} expires in {days} days, outside the {min_days}-{max_days} day entry window")]
    OutsideEntryWindow {
        /// Strategy kind.
        kind: StrategyKind,
        /// Calendar days from the snapshot to expiration.
        days: i64,
        /// Window lower bound.
        min_days: i64,
        /// Window upper bound.
        max_days: i64,
    },

    /// Selector confidence below the configured minimum.
    #[error("Confidence {confidence} below minimum {minimum}")]
    LowConfidence {
        /// Proposal confidence.
        confidence: f64,
        /// Configured minimum.
        minimum: f64,
    },
}

impl RejectionReason {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientCapital { .. } => "insufficient_capital",
            Self::PositionLimitExceeded { .. } => "position_limit_exceeded",
            Self::Validation { .. } => "validation",
            Self::Pricing { .. } => "pricing",
            Self::DuplicateUnderlying { .. } => "duplicate_underlying",
            Self::NonPositiveRisk { .. } => "non_positive_risk",
            Self::OutsideEntryWindow { .. } => "outside_entry_window",
            Self::LowConfidence { .. } => "low_confidence",
        }
    }
}

/// Outcome of an admission request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionDecision {
    /// Position booked; a copy of it as admitted.
    Admitted(Box<Position>),
    /// Nothing was mutated.
    Rejected(RejectionReason),
}

impl AdmissionDecision {
    /// Whether the strategy was admitted.
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

impl fmt::Display for AdmissionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admitted(position) => write!(
                f,
                "ADMITTED {} x{} ({})",
                position.strategy().kind(),
                position.quantity(),
                position.id()
            ),
            Self::Rejected(reason) => write!(f, "REJECTED: {reason}"),
        }
    }
}

/// Per-unit risk basis for a strategy.
///
/// Max loss is the payoff minimum when finite. When it is unbounded the naked
/// margin, `naked_margin_rate × spot × 100` per short contract, stands in.
/// Margin is the part of the max loss not already paid as a debit,
/// `max(max_loss - max(entry_cost, 0), 0)`: the full max loss for credit
/// structures, zero for debit structures whose debit is the whole risk. The
/// debit paid plus margin, the cash drawn per unit, is therefore the max loss.
/// A credit received is held apart as unearned premium.
#[must_use]
pub fn risk_profile(strategy: &Strategy, spot: f64, naked_margin_rate: f64) -> RiskProfile {
    let max_loss = match max_loss(strategy) {
        Bound::Finite(loss) => loss,
        Bound::Unbounded => {
            naked_margin_rate * spot * CONTRACT_MULTIPLIER * f64::from(strategy.short_contracts())
        }
    };
    let margin = (max_loss - strategy.entry_cost().max(0.0)).max(0.0);
    RiskProfile {
        max_profit: max_profit(strategy).finite(),
        max_loss,
        margin,
    }
}

/// Admission settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    /// Open position cap.
    pub max_concurrent_positions: usize,
    /// Allow several positions on one underlying.
    pub allow_duplicate_symbols: bool,
    /// Naked short margin rate.
    pub naked_margin_rate: f64,
    /// Proposals below this confidence are skipped.
    pub min_confidence: f64,
    /// Days-to-expiry windows by kind.
    pub entry_windows: Vec<EntryWindow>,
}

impl RiskLimits {
    /// Limits from configuration.
    #[must_use]
    pub fn from_config(simulation: &SimulationConfig, risk: &RiskConfig) -> Self {
        Self {
            max_concurrent_positions: simulation.max_concurrent_positions,
            allow_duplicate_symbols: risk.allow_duplicate_symbols,
            naked_margin_rate: risk.naked_margin_rate,
            min_confidence: risk.min_confidence,
            entry_windows: risk.entry_windows.clone(),
        }
    }

    /// Window for `kind`, if one is configured.
    #[must_use]
    pub fn entry_window(&self, kind: StrategyKind) -> Option<&EntryWindow> {
        self.entry_windows.iter().find(|w| w.kind == kind)
    }
}

/// Sizes and admits strategies into the portfolio it owns.
#[derive(Debug, Clone)]
pub struct RiskManager {
    portfolio: Portfolio,
    sizer: PositionSizer,
    limits: RiskLimits,
}

impl RiskManager {
    /// Manager over a fresh portfolio.
    #[must_use]
    pub const fn new(initial_capital: Decimal, sizer: PositionSizer, limits: RiskLimits) -> Self {
        Self {
            portfolio: Portfolio::new(initial_capital),
            sizer,
            limits,
        }
    }

    /// Manager built from configuration.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidAmount` if capital or risk fraction is not finite.
    pub fn from_config(simulation: &SimulationConfig, risk: &RiskConfig) -> Result<Self, LedgerError> {
        let capital = to_money("initial_capital", simulation.initial_capital)?;
        let risk_per_trade = Decimal::try_from(simulation.risk_per_trade).map_err(|_| {
            LedgerError::InvalidAmount {
                field: "risk_per_trade",
                value: simulation.risk_per_trade,
            }
        })?;
        Ok(Self::new(
            capital,
            PositionSizer::new(risk_per_trade),
            RiskLimits::from_config(simulation, risk),
        ))
    }

    /// Read-only view of the portfolio.
    #[must_use]
    pub const fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Admission limits.
    #[must_use]
    pub const fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Validate a proposal and request admission of its strategy.
    ///
    /// # Errors
    ///
    /// Only ledger invariant violations are returned as errors; every other
    /// failure is a `Rejected` decision.
    pub fn submit_proposal(
        &mut self,
        proposal: StrategyProposal,
        snapshot: &MarketSnapshot,
    ) -> Result<AdmissionDecision, LedgerError> {
        if proposal.confidence < self.limits.min_confidence {
            return Ok(self.reject(RejectionReason::LowConfidence {
                confidence: proposal.confidence,
                minimum: self.limits.min_confidence,
            }));
        }
        match proposal.into_strategy() {
            Ok(strategy) => self.propose_admission(strategy, snapshot),
            Err(e) => Ok(self.reject(RejectionReason::Validation {
                message: e.to_string(),
            })),
        }
    }

    /// Size a strategy and book it if every check passes.
    ///
    /// # Errors
    ///
    /// Only ledger invariant violations are returned as errors.
    pub fn propose_admission(
        &mut self,
        strategy: Strategy,
        snapshot: &MarketSnapshot,
    ) -> Result<AdmissionDecision, LedgerError> {
        let open = self.portfolio.open_count();
        if open >= self.limits.max_concurrent_positions {
            return Ok(self.reject(RejectionReason::PositionLimitExceeded {
                open,
                max: self.limits.max_concurrent_positions,
            }));
        }
        if !self.limits.allow_duplicate_symbols && self.portfolio.has_open_symbol(strategy.symbol()) {
            return Ok(self.reject(RejectionReason::DuplicateUnderlying {
                symbol: strategy.symbol().to_string(),
            }));
        }
        if let Err(e) = strategy.validate_for(snapshot) {
            return Ok(self.reject(RejectionReason::Validation {
                message: e.to_string(),
            }));
        }
        if let Some(window) = self.limits.entry_window(strategy.kind()) {
            let days = (strategy.expiration() - snapshot.date()).num_days();
            if !window.contains(days) {
                return Ok(self.reject(RejectionReason::OutsideEntryWindow {
                    kind: strategy.kind(),
                    days,
                    min_days: window.min_days,
                    max_days: window.max_days,
                }));
            }
        }
        if let Err(e) = price_strategy(&strategy, snapshot) {
            return Ok(self.reject(RejectionReason::Pricing {
                message: e.to_string(),
            }));
        }

        let profile = risk_profile(&strategy, snapshot.price(), self.limits.naked_margin_rate);
        if !(profile.max_loss > 0.0) {
            return Ok(self.reject(RejectionReason::NonPositiveRisk {
                max_loss: profile.max_loss,
            }));
        }

        let amounts = (
            to_money("entry_cost", strategy.entry_cost()),
            to_money("max_loss", profile.max_loss),
            to_money("margin", profile.margin),
        );
        let (Ok(unit_cost), Ok(unit_loss), Ok(unit_margin)) = amounts else {
            return Ok(self.reject(RejectionReason::Pricing {
                message: "strategy amounts are not finite".to_string(),
            }));
        };

        let input = SizingInput {
            equity: self.portfolio.equity(),
            available_cash: self.portfolio.cash(),
            max_loss_per_unit: unit_loss,
            cash_per_unit: unit_cost.max(Decimal::ZERO) + unit_margin,
        };
        let sizing = match self.sizer.size(&input) {
            Ok(sizing) => sizing,
            Err(SizingError::InsufficientCapital {
                risk_limit,
                cash_limit,
            }) => {
                return Ok(self.reject(RejectionReason::InsufficientCapital {
                    risk_limit,
                    cash_limit,
                }));
            }
            Err(SizingError::NonPositiveRisk { .. }) => {
                return Ok(self.reject(RejectionReason::NonPositiveRisk {
                    max_loss: profile.max_loss,
                }));
            }
        };

        let quantity = Decimal::from(sizing.quantity);
        let position = Position::open(
            strategy,
            snapshot.clone(),
            sizing.quantity,
            profile,
            unit_cost * quantity,
            unit_margin * quantity,
        );
        let admitted = position.clone();

        match self.portfolio.admit(position) {
            Ok(()) => {}
            Err(LedgerError::InsufficientCash { .. }) => {
                return Ok(self.reject(RejectionReason::InsufficientCapital {
                    risk_limit: sizing.risk_limit,
                    cash_limit: 0,
                }));
            }
            Err(e) => return Err(e),
        }

        let kind = admitted.strategy().kind();
        observability::record_admission(kind.as_str(), sizing.quantity);
        observability::set_open_positions(self.portfolio.open_count());
        info!(
            position_id = %admitted.id(),
            kind = %kind,
            symbol = admitted.strategy().symbol(),
            quantity = sizing.quantity,
            entry_cost = %admitted.entry_cost(),
            margin = %admitted.margin(),
            max_loss = profile.max_loss,
            "Position opened"
        );
        Ok(AdmissionDecision::Admitted(Box::new(admitted)))
    }

    fn reject(&self, reason: RejectionReason) -> AdmissionDecision {
        observability::record_rejection(reason.as_str());
        warn!(reason = reason.as_str(), detail = %reason, "Admission rejected");
        AdmissionDecision::Rejected(reason)
    }

    pub(crate) fn mark(
        &mut self,
        id: PositionId,
        mark_value: Decimal,
        underlying: f64,
    ) -> Result<(), LedgerError> {
        self.portfolio.mark(id, mark_value, underlying)
    }

    pub(crate) fn settle(
        &mut self,
        id: PositionId,
        reason: ExitReason,
        at: DateTime<Utc>,
    ) -> Result<TradeRecord, LedgerError> {
        let record = self.portfolio.close(id, reason, at)?;
        observability::record_close(record.outcome.to_string(), reason.as_str());
        observability::set_open_positions(self.portfolio.open_count());
        info!(
            position_id = %id,
            outcome = %record.outcome,
            exit_reason = %reason,
            pnl = %record.pnl,
            holding_days = record.holding_days,
            "Position closed"
        );
        Ok(record)
    }

    /// Restore the initial portfolio.
    pub fn reset(&mut self) {
        self.portfolio.reset();
        observability::set_open_positions(0);
    }
}
