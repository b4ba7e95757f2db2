//! Position lifecycle events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Position, PositionId, PositionState, StrategyKind};
use crate::ledger::{ExitReason, TradeRecord};

/// Something that happened to a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionEvent {
    /// Admitted into the portfolio.
    Opened {
        /// Position id.
        position_id: PositionId,
        /// Admission time.
        timestamp: DateTime<Utc>,
        /// Underlying symbol.
        symbol: String,
        /// Strategy kind.
        strategy_type: StrategyKind,
        /// Units admitted.
        quantity: u32,
        /// Cash paid (negative for a credit).
        entry_cost: Decimal,
        /// Margin reserved.
        margin: Decimal,
    },
    /// Marked to market.
    Updated {
        /// Position id.
        position_id: PositionId,
        /// Mark time.
        timestamp: DateTime<Utc>,
        /// Underlying price.
        underlying: f64,
        /// Liquidation value.
        mark_value: Decimal,
        /// Mark minus entry cost.
        unrealized_pnl: Decimal,
    },
    /// Reached a terminal state.
    Closed {
        /// Position id.
        position_id: PositionId,
        /// Close time.
        timestamp: DateTime<Utc>,
        /// Terminal state.
        outcome: PositionState,
        /// What triggered the close.
        exit_reason: ExitReason,
        /// Realized P&L.
        pnl: Decimal,
    },
}

impl PositionEvent {
    pub(crate) fn opened(position: &Position) -> Self {
        Self::Opened {
            position_id: position.id(),
            timestamp: position.opened_at(),
            symbol: position.strategy().symbol().to_string(),
            strategy_type: position.strategy().kind(),
            quantity: position.quantity(),
            entry_cost: position.entry_cost(),
            margin: position.margin(),
        }
    }

    pub(crate) fn updated(position: &Position, timestamp: DateTime<Utc>) -> Self {
        Self::Updated {
            position_id: position.id(),
            timestamp,
            underlying: position.last_underlying(),
            mark_value: position.mark_value(),
            unrealized_pnl: position.unrealized_pnl(),
        }
    }

    pub(crate) fn closed(record: &TradeRecord) -> Self {
        Self::Closed {
            position_id: record.position_id,
            timestamp: record.timestamp,
            outcome: record.outcome,
            exit_reason: record.exit_reason,
            pnl: record.pnl,
        }
    }

    /// Position the event refers to.
    #[must_use]
    pub const fn position_id(&self) -> PositionId {
        match self {
            Self::Opened { position_id, .. }
            | Self::Updated { position_id, .. }
            | Self::Closed { position_id, .. } => *position_id,
        }
    }

    /// When the event happened.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Opened { timestamp, .. }
            | Self::Updated { timestamp, .. }
            | Self::Closed { timestamp, .. } => *timestamp,
        }
    }

    /// Label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "opened",
            Self::Updated { .. } => "updated",
            Self::Closed { .. } => "closed",
        }
    }
}
