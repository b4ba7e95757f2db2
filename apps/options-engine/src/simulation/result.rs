//! Simulation output and performance summary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::events::PositionEvent;
use super::price_model::TRADING_DAYS_PER_YEAR;
use crate::ledger::TradeRecord;

/// Portfolio value at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Observation time.
    pub timestamp: DateTime<Utc>,
    /// Cash plus reserved margin, unearned premium and open marks.
    pub value: Decimal,
}

/// Performance summary over a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalMetrics {
    /// Starting capital.
    pub initial_value: Decimal,
    /// Last equity point.
    pub final_value: Decimal,
    /// `(final - initial) / initial × 100`.
    pub total_return_pct: Decimal,
    /// Sum of closed-trade P&L.
    pub total_realized_pnl: Decimal,
    /// Closed trades.
    pub total_trades: u64,
    /// Trades with positive P&L.
    pub winning_trades: u64,
    /// Trades with negative P&L.
    pub losing_trades: u64,
    /// Winners over total trades (0..=1).
    pub win_rate: Decimal,
    /// Mean P&L of winners.
    pub avg_win: Decimal,
    /// Mean loss magnitude of losers.
    pub avg_loss: Decimal,
    /// Gross profit over gross loss.
    pub profit_factor: Option<Decimal>,
    /// Largest peak-to-trough fall, in percent.
    pub max_drawdown_pct: Decimal,
    /// Annualized Sharpe ratio of daily equity returns.
    pub sharpe_ratio: Option<f64>,
    /// Positions still open at the end.
    pub open_positions: usize,
}

impl FinalMetrics {
    /// Summarize a run.
    #[must_use]
    pub fn calculate(
        initial_value: Decimal,
        equity_curve: &[EquityPoint],
        trades: &[TradeRecord],
        open_positions: usize,
        risk_free_rate: f64,
    ) -> Self {
        let final_value = equity_curve.last().map_or(initial_value, |p| p.value);
        let total_return_pct = if initial_value > Decimal::ZERO {
            ((final_value - initial_value) / initial_value * Decimal::ONE_HUNDRED).round_dp(4)
        } else {
            Decimal::ZERO
        };

        let mut gross_profit = Decimal::ZERO;
        let mut gross_loss = Decimal::ZERO;
        let mut winning = 0u64;
        let mut losing = 0u64;
        for trade in trades {
            if trade.pnl > Decimal::ZERO {
                gross_profit += trade.pnl;
                winning += 1;
            } else if trade.pnl < Decimal::ZERO {
                gross_loss += trade.pnl.abs();
                losing += 1;
            }
        }
        let total_trades = trades.len() as u64;

        let ratio = |num: Decimal, den: u64| {
            if den > 0 {
                (num / Decimal::from(den)).round_dp(4)
            } else {
                Decimal::ZERO
            }
        };

        Self {
            initial_value,
            final_value,
            total_return_pct,
            total_realized_pnl: trades.iter().map(|t| t.pnl).sum(),
            total_trades,
            winning_trades: winning,
            losing_trades: losing,
            win_rate: ratio(Decimal::from(winning), total_trades),
            avg_win: ratio(gross_profit, winning),
            avg_loss: ratio(gross_loss, losing),
            profit_factor: (gross_loss > Decimal::ZERO)
                .then(|| (gross_profit / gross_loss).round_dp(4)),
            max_drawdown_pct: max_drawdown_pct(initial_value, equity_curve),
            sharpe_ratio: sharpe_ratio(equity_curve, risk_free_rate),
            open_positions,
        }
    }
}

fn max_drawdown_pct(initial_value: Decimal, equity_curve: &[EquityPoint]) -> Decimal {
    let mut peak = initial_value;
    let mut max_drawdown = Decimal::ZERO;
    for point in equity_curve {
        if point.value > peak {
            peak = point.value;
        } else if peak > Decimal::ZERO {
            max_drawdown = max_drawdown.max((peak - point.value) / peak);
        }
    }
    (max_drawdown * Decimal::ONE_HUNDRED).round_dp(4)
}

/// `(mean daily return - r / 252) / stdev × √252`; `None` with fewer than
/// two returns or zero dispersion.
fn sharpe_ratio(equity_curve: &[EquityPoint], risk_free_rate: f64) -> Option<f64> {
    let values: Vec<f64> = equity_curve
        .iter()
        .filter_map(|p| p.value.to_f64())
        .collect();
    let returns: Vec<f64> = values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    if returns.len() < 2 {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stdev = variance.sqrt();
    if stdev <= f64::EPSILON {
        return None;
    }
    let excess = mean - risk_free_rate / TRADING_DAYS_PER_YEAR;
    Some(excess / stdev * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Days stepped.
    pub days: u32,
    /// Equity after setup and after every step.
    pub equity_curve: Vec<EquityPoint>,
    /// Closed trades, oldest first.
    pub trades: Vec<TradeRecord>,
    /// Lifecycle events, oldest first.
    pub events: Vec<PositionEvent>,
    /// Days that fell back to the model because market data was unavailable.
    pub degraded_days: u32,
    /// Whether the engine halted on a ledger invariant violation.
    pub halted: bool,
    /// Performance summary.
    pub final_metrics: FinalMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::scenario_time;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn curve(values: &[Decimal]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| EquityPoint {
                timestamp: scenario_time() + Duration::days(i as i64),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn test_empty_run() {
        let m = FinalMetrics::calculate(dec!(10000), &[], &[], 0, 0.05);
        assert_eq!(m.final_value, dec!(10000));
        assert_eq!(m.total_return_pct, Decimal::ZERO);
        assert_eq!(m.total_trades, 0);
        assert_eq!(m.win_rate, Decimal::ZERO);
        assert!(m.profit_factor.is_none());
        assert!(m.sharpe_ratio.is_none());
    }

    #[test]
    fn test_drawdown_and_return() {
        let points = curve(&[dec!(10000), dec!(11000), dec!(9900), dec!(10500)]);
        let m = FinalMetrics::calculate(dec!(10000), &points, &[], 1, 0.0);
        assert_eq!(m.final_value, dec!(10500));
        assert_eq!(m.total_return_pct, dec!(5));
        // 11000 -> 9900
        assert_eq!(m.max_drawdown_pct, dec!(10));
        assert_eq!(m.open_positions, 1);
        assert!(m.sharpe_ratio.is_some());
    }

    #[test]
    fn test_flat_curve_has_no_sharpe() {
        let points = curve(&[dec!(10000); 5]);
        assert!(sharpe_ratio(&points, 0.0).is_none());
    }
}
