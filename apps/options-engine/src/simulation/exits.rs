//! Exit rules, checked in priority order every simulated day.
//!
//! 1. Expiration reached: settle at intrinsic value.
//! 2. Unrealized P&L at or above the profit target.
//! 3. Unrealized P&L at or below the stop loss.
//! 4. Time exit once a share of the entry time-to-expiry has elapsed, half by
//!    default. Disabled when the fraction is `None`.
//!
//! Thresholds scale with the position's risk profile and quantity. The profit
//! target is a fraction of max profit, or of the max-loss basis when profit is
//! unbounded. The stop is a fraction of max loss.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;

use crate::config::ExitConfig;
use crate::domain::{Position, years_between};
use crate::ledger::ExitReason;

/// Exit thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitPolicy {
    /// Fraction of max profit that triggers a take-profit.
    pub profit_target_pct: f64,
    /// Fraction of max loss that triggers a stop.
    pub stop_loss_pct: f64,
    /// Fraction of entry time-to-expiry after which the position is closed.
    pub time_exit_fraction: Option<f64>,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self::from_config(&ExitConfig::default())
    }
}

impl ExitPolicy {
    /// Policy from configuration.
    #[must_use]
    pub const fn from_config(config: &ExitConfig) -> Self {
        Self {
            profit_target_pct: config.profit_target_pct,
            stop_loss_pct: config.stop_loss_pct,
            time_exit_fraction: config.time_exit_fraction,
        }
    }

    /// Profit level (total, account currency) that triggers a take-profit.
    #[must_use]
    pub fn profit_target(&self, position: &Position) -> f64 {
        let risk = position.risk();
        let basis = risk.max_profit.unwrap_or(risk.max_loss);
        self.profit_target_pct * basis * f64::from(position.quantity())
    }

    /// Loss level (total, negative) that triggers a stop.
    #[must_use]
    pub fn stop_loss(&self, position: &Position) -> f64 {
        -self.stop_loss_pct * position.risk().max_loss * f64::from(position.quantity())
    }

    /// First exit rule that fires for an open position marked as of `today`.
    #[must_use]
    pub fn evaluate(&self, position: &Position, today: NaiveDate, now: DateTime<Utc>) -> Option<ExitReason> {
        if today >= position.strategy().expiration() {
            return Some(ExitReason::Expiration);
        }

        let unrealized = position.unrealized_pnl().to_f64()?;
        if unrealized >= self.profit_target(position) {
            return Some(ExitReason::ProfitTarget);
        }
        if unrealized <= self.stop_loss(position) {
            return Some(ExitReason::StopLoss);
        }

        if let Some(fraction) = self.time_exit_fraction {
            let total = years_between(position.opened_at(), position.strategy().expiration());
            let elapsed = total - years_between(now, position.strategy().expiration());
            if total > 0.0 && elapsed / total >= fraction {
                return Some(ExitReason::TimeExit);
            }
        }
        None
    }
}
