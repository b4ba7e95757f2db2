//! Portfolio accounting.
//!
//! Cash flows:
//!
//! ```text
//! admit:  cash -= debit + margin                 reserved += margin    unearned += credit
//! close:  cash += exit_value + margin + credit    reserved -= margin    unearned -= credit
//! ```
//!
//! A credit is not spendable until the position closes, so it sits in
//! `unearned` rather than cash. After every mutation the books must satisfy
//! `cash + reserved = initial + realized - Σ open debits`, which keeps
//! `cash + reserved` at or below `initial + realized`. Cash, reserved and
//! unearned stay non-negative and match what the open positions hold.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::error::LedgerError;
use super::history::{ExitReason, LedgerEntry, TradeHistory, TradeRecord};
use crate::domain::{Position, PositionId};

/// Round a float amount to cents.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` for NaN or infinite values.
pub fn to_money(field: &'static str, value: f64) -> Result<Decimal, LedgerError> {
    Decimal::try_from(value)
        .map(|d| d.round_dp(2))
        .map_err(|_| LedgerError::InvalidAmount { field, value })
}

/// Cash, reserved margin, open positions and trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    initial_capital: Decimal,
    cash: Decimal,
    reserved: Decimal,
    unearned_premium: Decimal,
    realized_pnl: Decimal,
    positions: Vec<Position>,
    history: TradeHistory,
}

impl Portfolio {
    /// Fresh portfolio holding only cash.
    #[must_use]
    pub const fn new(initial_capital: Decimal) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            reserved: Decimal::ZERO,
            unearned_premium: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            positions: Vec::new(),
            history: TradeHistory::new(),
        }
    }

    /// Starting cash.
    #[must_use]
    pub const fn initial_capital(&self) -> Decimal {
        self.initial_capital
    }

    /// Unreserved cash.
    #[must_use]
    pub const fn cash(&self) -> Decimal {
        self.cash
    }

    /// Margin held against open positions.
    #[must_use]
    pub const fn reserved(&self) -> Decimal {
        self.reserved
    }

    /// Credits received on open positions, released at close.
    #[must_use]
    pub const fn unearned_premium(&self) -> Decimal {
        self.unearned_premium
    }

    /// Realized P&L across closed positions.
    #[must_use]
    pub const fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Open positions in admission order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Open position by id.
    #[must_use]
    pub fn position(&self, id: PositionId) -> Option<&Position> {
        self.positions.iter().find(|p| p.id() == id)
    }

    /// Number of open positions.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether a position on `symbol` is open.
    #[must_use]
    pub fn has_open_symbol(&self, symbol: &str) -> bool {
        self.positions.iter().any(|p| p.strategy().symbol() == symbol)
    }

    /// Ledger lines.
    #[must_use]
    pub const fn history(&self) -> &TradeHistory {
        &self.history
    }

    /// Sum of open position marks.
    #[must_use]
    pub fn market_value(&self) -> Decimal {
        self.positions.iter().map(Position::mark_value).sum()
    }

    /// Unrealized P&L across open positions.
    #[must_use]
    pub fn unrealized_pnl(&self) -> Decimal {
        self.positions.iter().map(Position::unrealized_pnl).sum()
    }

    /// Liquidation value: cash + reserved margin + unearned premium + open marks.
    #[must_use]
    pub fn equity(&self) -> Decimal {
        self.cash + self.reserved + self.unearned_premium + self.market_value()
    }

    /// Book a newly admitted position.
    ///
    /// # Errors
    ///
    /// `InsufficientCash` leaves the portfolio untouched. Invariant violations
    /// are reported after the mutation and are fatal to the caller.
    pub(crate) fn admit(&mut self, position: Position) -> Result<(), LedgerError> {
        if self.position(position.id()).is_some() {
            return Err(LedgerError::DuplicatePosition { id: position.id() });
        }
        let required = position.premium_paid() + position.margin();
        if required > self.cash {
            return Err(LedgerError::InsufficientCash {
                required,
                available: self.cash,
            });
        }

        self.cash -= required;
        self.reserved += position.margin();
        self.unearned_premium += position.premium_received();
        self.history.append(LedgerEntry::Opened {
            position_id: position.id(),
            timestamp: position.opened_at(),
            symbol: position.strategy().symbol().to_string(),
            strategy_type: position.strategy().kind(),
            quantity: position.quantity(),
            entry_cost: position.entry_cost(),
            margin: position.margin(),
        });
        debug!(
            position_id = %position.id(),
            entry_cost = %position.entry_cost(),
            margin = %position.margin(),
            cash = %self.cash,
            "Position booked"
        );
        self.positions.push(position);
        self.check_invariants()
    }

    /// Record a new mark on an open position.
    ///
    /// # Errors
    ///
    /// Returns `PositionNotFound` if no open position has this id.
    pub(crate) fn mark(
        &mut self,
        id: PositionId,
        mark_value: Decimal,
        underlying: f64,
    ) -> Result<(), LedgerError> {
        let position = self
            .positions
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(LedgerError::PositionNotFound { id })?;
        position.mark(mark_value, underlying);
        Ok(())
    }

    /// Close an open position at its current mark, release its margin and
    /// append the trade record.
    ///
    /// # Errors
    ///
    /// `PositionNotFound` and lifecycle errors leave the portfolio untouched.
    /// Invariant violations are reported after the mutation.
    pub(crate) fn close(
        &mut self,
        id: PositionId,
        reason: ExitReason,
        at: DateTime<Utc>,
    ) -> Result<TradeRecord, LedgerError> {
        let index = self
            .positions
            .iter()
            .position(|p| p.id() == id)
            .ok_or(LedgerError::PositionNotFound { id })?;

        let mut position = self.positions[index].clone();
        let pnl = position.close(reason.terminal_state(), at)?;
        self.positions.remove(index);

        self.cash += position.mark_value() + position.margin() + position.premium_received();
        self.reserved -= position.margin();
        self.unearned_premium -= position.premium_received();
        self.realized_pnl += pnl;

        let record = TradeRecord::from_closed(&position, reason, at);
        self.history.append(LedgerEntry::Closed(record.clone()));
        debug!(
            position_id = %id,
            %reason,
            pnl = %pnl,
            cash = %self.cash,
            "Position settled"
        );
        self.check_invariants()?;
        Ok(record)
    }

    /// Verify the accounting identities.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        let result = self.invariant_violation().map_or(Ok(()), Err);
        if let Err(violation) = &result {
            error!(error = %violation, "Ledger invariant violated");
        }
        result
    }

    fn invariant_violation(&self) -> Option<LedgerError> {
        if self.cash < Decimal::ZERO {
            return Some(LedgerError::NegativeCash { cash: self.cash });
        }
        if self.reserved < Decimal::ZERO {
            return Some(LedgerError::NegativeReserved {
                reserved: self.reserved,
            });
        }
        if self.unearned_premium < Decimal::ZERO {
            return Some(LedgerError::NegativeUnearned {
                unearned: self.unearned_premium,
            });
        }

        let held: Decimal = self.positions.iter().map(Position::margin).sum();
        if held != self.reserved {
            return Some(LedgerError::ReservedMismatch {
                reserved: self.reserved,
                expected: held,
            });
        }
        let credits: Decimal = self.positions.iter().map(Position::premium_received).sum();
        if credits != self.unearned_premium {
            return Some(LedgerError::UnearnedMismatch {
                unearned: self.unearned_premium,
                expected: credits,
            });
        }

        let limit = self.initial_capital + self.realized_pnl;
        let actual = self.cash + self.reserved;
        if actual > limit {
            return Some(LedgerError::CapitalExceeded {
                committed: actual,
                limit,
            });
        }
        let debits: Decimal = self.positions.iter().map(Position::premium_paid).sum();
        let expected = limit - debits;
        if actual != expected {
            return Some(LedgerError::BalanceMismatch { actual, expected });
        }

        for (i, p) in self.positions.iter().enumerate() {
            if self.positions[..i].iter().any(|q| q.id() == p.id()) {
                return Some(LedgerError::DuplicatePosition { id: p.id() });
            }
        }
        None
    }

    /// Discard all positions and history and restore initial cash.
    pub fn reset(&mut self) {
        *self = Self::new(self.initial_capital);
    }
}
