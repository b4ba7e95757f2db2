//! Append-only trade history.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Leg, Position, PositionId, PositionState, StrategyKind};

/// Why a position left the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Held to expiration and settled.
    Expiration,
    /// Profit target reached.
    ProfitTarget,
    /// Stop loss triggered.
    StopLoss,
    /// Time-based exit.
    TimeExit,
    /// External close command.
    Manual,
}

impl ExitReason {
    /// Terminal lifecycle state this reason leads to.
    #[must_use]
    pub const fn terminal_state(self) -> PositionState {
        match self {
            Self::Expiration => PositionState::ExpiredSettled,
            Self::ProfitTarget | Self::StopLoss | Self::TimeExit => PositionState::ClosedEarly,
            Self::Manual => PositionState::ClosedManual,
        }
    }

    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expiration => "expiration",
            Self::ProfitTarget => "profit_target",
            Self::StopLoss => "stop_loss",
            Self::TimeExit => "time_exit",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Position id.
    pub position_id: PositionId,
    /// Close time.
    pub timestamp: DateTime<Utc>,
    /// Admission time.
    pub opened_at: DateTime<Utc>,
    /// Underlying symbol.
    pub symbol: String,
    /// Strategy kind.
    pub strategy_type: StrategyKind,
    /// Legs of one unit.
    pub legs: Vec<Leg>,
    /// Units held.
    pub quantity: u32,
    /// Net value per unit per share at entry (debit positive).
    pub entry_price: f64,
    /// Net value per unit per share at exit.
    pub exit_price: f64,
    /// Underlying price at admission.
    pub underlying_entry: f64,
    /// Underlying price at close.
    pub underlying_exit: f64,
    /// Total cash paid at entry (negative for a credit).
    pub entry_cost: Decimal,
    /// Total liquidation value at exit.
    pub exit_value: Decimal,
    /// Realized P&L.
    pub pnl: Decimal,
    /// Terminal state.
    pub outcome: PositionState,
    /// What triggered the close.
    pub exit_reason: ExitReason,
    /// Calendar days held.
    pub holding_days: f64,
}

impl TradeRecord {
    /// Build the record for a position that has just reached a terminal state.
    #[must_use]
    pub fn from_closed(position: &Position, reason: ExitReason, at: DateTime<Utc>) -> Self {
        let strategy = position.strategy();
        Self {
            position_id: position.id(),
            timestamp: at,
            opened_at: position.opened_at(),
            symbol: strategy.symbol().to_string(),
            strategy_type: strategy.kind(),
            legs: strategy.legs().to_vec(),
            quantity: position.quantity(),
            entry_price: position.entry_price(),
            exit_price: position.mark_price(),
            underlying_entry: position.entry_snapshot().price(),
            underlying_exit: position.last_underlying(),
            entry_cost: position.entry_cost(),
            exit_value: position.mark_value(),
            pnl: position.realized_pnl(),
            outcome: position.state(),
            exit_reason: reason,
            holding_days: position.holding_days(at),
        }
    }

    /// Whether the trade made money.
    #[must_use]
    pub fn is_winner(&self) -> bool {
        self.pnl > Decimal::ZERO
    }
}

/// One ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntry {
    /// Position admitted.
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
    /// Position reached a terminal state.
    Closed(TradeRecord),
}

impl LedgerEntry {
    /// Position the entry refers to.
    #[must_use]
    pub const fn position_id(&self) -> PositionId {
        match self {
            Self::Opened { position_id, .. } => *position_id,
            Self::Closed(record) => record.position_id,
        }
    }
}

/// Ledger lines in the order they were written. Entries are never edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeHistory {
    entries: Vec<LedgerEntry>,
}

impl TradeHistory {
    /// Empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn append(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Every entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Closed-trade records, oldest first.
    pub fn trades(&self) -> impl Iterator<Item = &TradeRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            LedgerEntry::Closed(record) => Some(record),
            LedgerEntry::Opened { .. } => None,
        })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ExitReason::Expiration, PositionState::ExpiredSettled)]
    #[test_case(ExitReason::ProfitTarget, PositionState::ClosedEarly)]
    #[test_case(ExitReason::StopLoss, PositionState::ClosedEarly)]
    #[test_case(ExitReason::TimeExit, PositionState::ClosedEarly)]
    #[test_case(ExitReason::Manual, PositionState::ClosedManual)]
    fn test_terminal_state(reason: ExitReason, state: PositionState) {
        assert_eq!(reason.terminal_state(), state);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_entry_serde_tag() {
        let entry = LedgerEntry::Opened {
            position_id: PositionId::new(),
            timestamp: crate::domain::fixtures::scenario_time(),
            symbol: "SPY".to_string(),
            strategy_type: StrategyKind::IronCondor,
            quantity: 2,
            entry_cost: Decimal::new(-400, 0),
            margin: Decimal::new(600, 0),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "OPENED");
        assert_eq!(json["strategy_type"], "IRON_CONDOR");
        let back: LedgerEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
