//! Positions and their lifecycle state machine.
//!
//! ```text
//! OPEN ──mark──> OPEN
//!  ├──expiration──> EXPIRED_SETTLED
//!  ├──target/stop─> CLOSED_EARLY
//!  └──command─────> CLOSED_MANUAL
//! ```
//!
//! Terminal states accept no further transitions.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::LifecycleError;
use super::snapshot::MarketSnapshot;
use super::strategy::Strategy;

/// Unique position identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(Uuid);

impl PositionId {
    /// Fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for PositionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionState {
    /// Live and marked daily.
    Open,
    /// Held to expiration and settled at intrinsic value.
    ExpiredSettled,
    /// Closed at mark after hitting a profit target, stop, or time exit.
    ClosedEarly,
    /// Closed at mark by an external command.
    ClosedManual,
}

impl PositionState {
    /// Whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Whether `self -> to` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (
                Self::Open,
                Self::Open | Self::ExpiredSettled | Self::ClosedEarly | Self::ClosedManual
            )
        )
    }

    /// States reachable from `self`.
    #[must_use]
    pub fn valid_next_states(self) -> Vec<Self> {
        [
            Self::Open,
            Self::ExpiredSettled,
            Self::ClosedEarly,
            Self::ClosedManual,
        ]
        .into_iter()
        .filter(|to| self.can_transition_to(*to))
        .collect()
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns `LifecycleError::InvalidTransition` for an illegal transition.
    pub const fn validate_transition(self, to: Self) -> Result<(), LifecycleError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for PositionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::ExpiredSettled => write!(f, "EXPIRED_SETTLED"),
            Self::ClosedEarly => write!(f, "CLOSED_EARLY"),
            Self::ClosedManual => write!(f, "CLOSED_MANUAL"),
        }
    }
}

/// Per-unit risk profile captured at admission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Max profit per unit, `None` when unbounded.
    pub max_profit: Option<f64>,
    /// Loss per unit used for sizing and stops.
    pub max_loss: f64,
    /// Cash set aside per unit on top of any debit paid.
    pub margin: f64,
}

/// A strategy held in the portfolio.
///
/// Money amounts are totals across all units, in account currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    id: PositionId,
    strategy: Strategy,
    entry_snapshot: MarketSnapshot,
    quantity: u32,
    state: PositionState,
    risk: RiskProfile,
    entry_cost: Decimal,
    margin: Decimal,
    mark_value: Decimal,
    unrealized_pnl: Decimal,
    realized_pnl: Decimal,
    last_underlying: f64,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
}

impl Position {
    /// Open a position at its entry snapshot.
    ///
    /// The initial mark equals the entry cost, so unrealized P&L starts at zero.
    #[must_use]
    pub fn open(
        strategy: Strategy,
        entry_snapshot: MarketSnapshot,
        quantity: u32,
        risk: RiskProfile,
        entry_cost: Decimal,
        margin: Decimal,
    ) -> Self {
        let opened_at = entry_snapshot.timestamp();
        let last_underlying = entry_snapshot.price();
        Self {
            id: PositionId::new(),
            strategy,
            entry_snapshot,
            quantity,
            state: PositionState::Open,
            risk,
            entry_cost,
            margin,
            mark_value: entry_cost,
            unrealized_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            last_underlying,
            opened_at,
            closed_at: None,
        }
    }

    /// Position id.
    #[must_use]
    pub const fn id(&self) -> PositionId {
        self.id
    }

    /// The strategy held.
    #[must_use]
    pub const fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Snapshot at admission.
    #[must_use]
    pub const fn entry_snapshot(&self) -> &MarketSnapshot {
        &self.entry_snapshot
    }

    /// Strategy units held.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PositionState {
        self.state
    }

    /// Whether the position is still open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.state, PositionState::Open)
    }

    /// Per-unit risk profile.
    #[must_use]
    pub const fn risk(&self) -> &RiskProfile {
        &self.risk
    }

    /// Cash paid at entry (negative for a credit).
    #[must_use]
    pub const fn entry_cost(&self) -> Decimal {
        self.entry_cost
    }

    /// Debit paid at entry, zero for a credit.
    #[must_use]
    pub fn premium_paid(&self) -> Decimal {
        self.entry_cost.max(Decimal::ZERO)
    }

    /// Credit received at entry, zero for a debit.
    #[must_use]
    pub fn premium_received(&self) -> Decimal {
        (-self.entry_cost).max(Decimal::ZERO)
    }

    /// Margin reserved for this position.
    #[must_use]
    pub const fn margin(&self) -> Decimal {
        self.margin
    }

    /// Current liquidation value (negative for a net short structure).
    #[must_use]
    pub const fn mark_value(&self) -> Decimal {
        self.mark_value
    }

    /// Mark value minus entry cost.
    #[must_use]
    pub const fn unrealized_pnl(&self) -> Decimal {
        self.unrealized_pnl
    }

    /// P&L locked in at close; zero while open.
    #[must_use]
    pub const fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Underlying price at the last mark.
    #[must_use]
    pub const fn last_underlying(&self) -> f64 {
        self.last_underlying
    }

    /// Admission time.
    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Close time, once terminal.
    #[must_use]
    pub const fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    /// Net value per strategy unit per share at entry (signed, debit positive).
    #[must_use]
    pub fn entry_price(&self) -> f64 {
        self.strategy.entry_cost() / crate::domain::CONTRACT_MULTIPLIER
    }

    /// Net value per strategy unit per share at the current mark.
    #[must_use]
    pub fn mark_price(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        let units = f64::from(self.quantity) * crate::domain::CONTRACT_MULTIPLIER;
        self.mark_value.to_f64().unwrap_or_default() / units
    }

    /// Record a new mark. State does not change.
    pub(crate) fn mark(&mut self, mark_value: Decimal, underlying: f64) {
        self.mark_value = mark_value;
        self.unrealized_pnl = mark_value - self.entry_cost;
        self.last_underlying = underlying;
    }

    /// Move to a terminal state at the current mark and lock in P&L.
    pub(crate) fn close(
        &mut self,
        to: PositionState,
        at: DateTime<Utc>,
    ) -> Result<Decimal, LifecycleError> {
        self.state.validate_transition(to)?;
        if !to.is_terminal() {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        self.realized_pnl = self.mark_value - self.entry_cost;
        self.unrealized_pnl = Decimal::ZERO;
        self.closed_at = Some(at);
        Ok(self.realized_pnl)
    }

    /// Calendar days held up to `at`.
    #[must_use]
    pub fn holding_days(&self, at: DateTime<Utc>) -> f64 {
        let seconds = (at - self.opened_at).num_seconds();
        if seconds <= 0 {
            return 0.0;
        }
        seconds as f64 / 86_400.0
    }
}
