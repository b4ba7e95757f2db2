//! Day-stepping simulation engine.
//!
//! Every step:
//!
//! 1. Resolve the day's snapshot: observed data wins, otherwise the price model
//!    evolves the last snapshot (flagged degraded when data was expected).
//! 2. Reprice each open position and record the mark.
//! 3. Apply the first exit rule that fires.
//! 4. On trading days, submit the day's proposal for admission.
//! 5. Append an equity point and verify the ledger.
//!
//! A ledger invariant violation halts the engine; every later call fails with
//! `HALTED` until `reset`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::events::PositionEvent;
use super::exits::ExitPolicy;
use super::input::{DayInput, MarketInput};
use super::price_model::{PriceModel, start_of_day};
use super::result::{EquityPoint, FinalMetrics, SimulationResult};
use crate::config::Config;
use crate::domain::{MarketSnapshot, Position, PositionId, Strategy, StrategyProposal};
use crate::error::{EngineError, ErrorCode};
use crate::ledger::{ExitReason, LedgerError, Portfolio, TradeRecord, to_money};
use crate::observability;
use crate::pricing::price_strategy;
use crate::risk::{AdmissionDecision, RiskManager};

/// Liquidation value of one strategy unit at expiration.
fn settlement_value(strategy: &Strategy, spot: f64) -> f64 {
    strategy
        .legs()
        .iter()
        .map(|leg| leg.value_at_price(leg.contract().intrinsic(spot)))
        .sum()
}

/// What happened on one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    /// 1-based day number.
    pub day: u32,
    /// Snapshot time.
    pub timestamp: DateTime<Utc>,
    /// Underlying price used for the day.
    pub underlying: f64,
    /// Market data was unavailable and the model filled in.
    pub degraded: bool,
    /// Admission outcome, when a proposal was submitted.
    pub admission: Option<AdmissionDecision>,
    /// Trades closed during the day.
    pub closed: Vec<TradeRecord>,
    /// Lifecycle events emitted during the day.
    pub events: Vec<PositionEvent>,
    /// Equity after the day.
    pub equity: Decimal,
}

/// Owns the risk manager (and through it the portfolio) and advances the
/// simulation one trading day at a time.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    risk: RiskManager,
    exits: ExitPolicy,
    model: PriceModel,
    initial_snapshot: MarketSnapshot,
    snapshot: MarketSnapshot,
    trading_interval: u32,
    day: u32,
    degraded_days: u32,
    equity_curve: Vec<EquityPoint>,
    events: Vec<PositionEvent>,
    halted: Option<String>,
}

impl SimulationEngine {
    /// Engine starting from `snapshot`.
    #[must_use]
    pub fn new(
        risk: RiskManager,
        exits: ExitPolicy,
        model: PriceModel,
        snapshot: MarketSnapshot,
        trading_interval: u32,
    ) -> Self {
        let mut engine = Self {
            risk,
            exits,
            model,
            initial_snapshot: snapshot.clone(),
            snapshot,
            trading_interval: trading_interval.max(1),
            day: 0,
            degraded_days: 0,
            equity_curve: Vec::new(),
            events: Vec::new(),
            halted: None,
        };
        engine.record_equity();
        engine
    }

    /// Engine built from configuration, starting at the configured symbol,
    /// price and date.
    ///
    /// # Errors
    ///
    /// Returns a `CONFIG` error if capital or risk fraction cannot be represented.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let sim = &config.simulation;
        let risk = RiskManager::from_config(sim, &config.risk)
            .map_err(|e| EngineError::new(ErrorCode::Config, e.to_string()))?;
        let snapshot = MarketSnapshot::flat(
            sim.symbol.clone(),
            sim.initial_price,
            start_of_day(sim.start_date),
            sim.risk_free_rate,
            sim.volatility,
        );
        Ok(Self::new(
            risk,
            ExitPolicy::from_config(&config.exits),
            PriceModel::new(sim.seed),
            snapshot,
            sim.trading_interval_days,
        ))
    }

    /// Read-only view of the portfolio.
    #[must_use]
    pub const fn portfolio(&self) -> &Portfolio {
        self.risk.portfolio()
    }

    /// Latest snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &MarketSnapshot {
        &self.snapshot
    }

    /// Days stepped since construction or reset.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Exit thresholds in force.
    #[must_use]
    pub const fn exit_policy(&self) -> &ExitPolicy {
        &self.exits
    }

    /// Whether the engine refuses work until reset.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Invariant violation that halted the engine.
    #[must_use]
    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    /// Lifecycle events so far.
    #[must_use]
    pub fn events(&self) -> &[PositionEvent] {
        &self.events
    }

    /// Equity curve so far.
    #[must_use]
    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Days between admission attempts.
    #[must_use]
    pub const fn trading_interval(&self) -> u32 {
        self.trading_interval
    }

    /// Whether the next step requests a proposal.
    #[must_use]
    pub const fn next_is_trading_day(&self) -> bool {
        self.day % self.trading_interval == 0
    }

    /// Advance one day with a prepared input. The proposal is submitted only
    /// on trading days.
    ///
    /// # Errors
    ///
    /// Fails with `HALTED` once halted, or `LEDGER_INVARIANT` when this step
    /// breaks the books.
    pub fn step(&mut self, input: DayInput) -> Result<DayReport, EngineError> {
        let DayInput { market, proposal } = input;
        self.step_with(market, |_| proposal)
    }

    /// Advance one day, asking `propose` for a candidate once the day's
    /// snapshot is known and positions are settled.
    ///
    /// # Errors
    ///
    /// Same as [`SimulationEngine::step`].
    pub fn step_with<F>(&mut self, market: MarketInput, propose: F) -> Result<DayReport, EngineError>
    where
        F: FnOnce(&MarketSnapshot) -> Option<StrategyProposal>,
    {
        self.ensure_running()?;
        let trading_day = self.next_is_trading_day();
        let (snapshot, degraded) = self.resolve_snapshot(market);
        self.snapshot = snapshot;
        self.day += 1;

        let mut report = DayReport {
            day: self.day,
            timestamp: self.snapshot.timestamp(),
            underlying: self.snapshot.price(),
            degraded,
            admission: None,
            closed: Vec::new(),
            events: Vec::new(),
            equity: Decimal::ZERO,
        };

        let ids: Vec<PositionId> = self.portfolio().positions().iter().map(Position::id).collect();
        for id in ids {
            if let Some(event) = self.reprice(id)? {
                report.events.push(event);
            }
            if let Some(record) = self.apply_exit(id)? {
                report.events.push(PositionEvent::closed(&record));
                report.closed.push(record);
            }
        }

        if trading_day && let Some(proposal) = propose(&self.snapshot) {
            let snapshot = self.snapshot.clone();
            let result = self.risk.submit_proposal(proposal, &snapshot);
            let decision = self.ledger(result)?;
            if let AdmissionDecision::Admitted(position) = &decision {
                report.events.push(PositionEvent::opened(position));
            }
            report.admission = Some(decision);
        }

        report.equity = self.record_equity();
        let check = self.portfolio().check_invariants();
        self.ledger(check)?;
        self.events.extend(report.events.iter().cloned());

        debug!(
            day = self.day,
            underlying = report.underlying,
            degraded,
            equity = %report.equity,
            open = self.portfolio().open_count(),
            "Day complete"
        );
        Ok(report)
    }

    /// Run `days` model-driven steps, consulting `propose` on trading days.
    ///
    /// # Errors
    ///
    /// Stops at the first fatal error; the partial run stays available
    /// through [`SimulationEngine::result`].
    pub fn run<F>(&mut self, days: u32, mut propose: F) -> Result<SimulationResult, EngineError>
    where
        F: FnMut(&MarketSnapshot) -> Option<StrategyProposal>,
    {
        info!(
            days,
            symbol = self.snapshot.symbol(),
            seed = self.model.seed(),
            "Starting simulation"
        );
        for _ in 0..days {
            self.step_with(MarketInput::Simulated, &mut propose)?;
        }
        let result = self.result();
        info!(
            days = result.days,
            trades = result.final_metrics.total_trades,
            final_value = %result.final_metrics.final_value,
            return_pct = %result.final_metrics.total_return_pct,
            "Simulation complete"
        );
        Ok(result)
    }

    /// Submit a proposal at the current snapshot, outside the daily cadence.
    ///
    /// # Errors
    ///
    /// Fails with `HALTED` once halted, or on an invariant violation.
    pub fn submit(&mut self, proposal: StrategyProposal) -> Result<AdmissionDecision, EngineError> {
        self.ensure_running()?;
        let snapshot = self.snapshot.clone();
        let result = self.risk.submit_proposal(proposal, &snapshot);
        let decision = self.ledger(result)?;
        if let AdmissionDecision::Admitted(position) = &decision {
            self.events.push(PositionEvent::opened(position));
        }
        Ok(decision)
    }

    /// Close an open position at the current snapshot's mark.
    ///
    /// # Errors
    ///
    /// `NOT_FOUND` for an unknown id, `HALTED` once halted.
    pub fn close_position(&mut self, id: PositionId) -> Result<TradeRecord, EngineError> {
        self.ensure_running()?;
        if self.portfolio().position(id).is_none() {
            return Err(EngineError::position_not_found(&id.to_string()));
        }
        if let Some(event) = self.reprice(id)? {
            self.events.push(event);
        }
        let at = self.snapshot.timestamp();
        let result = self.risk.settle(id, ExitReason::Manual, at);
        let record = self.ledger(result)?;
        self.events.push(PositionEvent::closed(&record));
        Ok(record)
    }

    /// Restore the initial portfolio, snapshot and random stream, and clear a halt.
    pub fn reset(&mut self) {
        self.risk.reset();
        self.model.reseed();
        self.snapshot = self.initial_snapshot.clone();
        self.day = 0;
        self.degraded_days = 0;
        self.equity_curve.clear();
        self.events.clear();
        self.halted = None;
        self.record_equity();
        info!("Simulation reset");
    }

    /// Snapshot of the run so far.
    #[must_use]
    pub fn result(&self) -> SimulationResult {
        let trades: Vec<TradeRecord> = self.portfolio().history().trades().cloned().collect();
        let final_metrics = FinalMetrics::calculate(
            self.portfolio().initial_capital(),
            &self.equity_curve,
            &trades,
            self.portfolio().open_count(),
            self.initial_snapshot.risk_free_rate(),
        );
        SimulationResult {
            days: self.day,
            equity_curve: self.equity_curve.clone(),
            trades,
            events: self.events.clone(),
            degraded_days: self.degraded_days,
            halted: self.is_halted(),
            final_metrics,
        }
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        match &self.halted {
            Some(cause) => Err(EngineError::halted(cause)),
            None => Ok(()),
        }
    }

    /// Map a ledger result, halting on invariant violations.
    fn ledger<T>(&mut self, result: Result<T, LedgerError>) -> Result<T, EngineError> {
        result.map_err(|e| {
            if e.is_invariant_violation() {
                error!(error = %e, day = self.day, "Ledger invariant violated; halting engine");
                observability::record_ledger_halt();
                self.halted = Some(e.to_string());
            }
            EngineError::from(e)
        })
    }

    fn resolve_snapshot(&mut self, market: MarketInput) -> (MarketSnapshot, bool) {
        let reason = match market {
            MarketInput::Simulated => return (self.model.next_snapshot(&self.snapshot), false),
            MarketInput::Observed { snapshot } => {
                if snapshot.symbol() != self.snapshot.symbol() {
                    format!(
                        "observed symbol {} does not match {}",
                        snapshot.symbol(),
                        self.snapshot.symbol()
                    )
                } else if snapshot.timestamp() <= self.snapshot.timestamp() {
                    format!("stale observation at {}", snapshot.timestamp())
                } else if !(snapshot.price() > 0.0) {
                    format!("non-positive price {}", snapshot.price())
                } else {
                    return (snapshot, false);
                }
            }
            MarketInput::Unavailable { reason } => reason,
        };
        warn!(day = self.day + 1, %reason, "Market data unavailable; using price model");
        observability::record_degraded_day();
        self.degraded_days += 1;
        (self.model.next_snapshot(&self.snapshot), true)
    }

    /// Mark a position at the current snapshot. A pricing failure keeps the
    /// previous mark.
    fn reprice(&mut self, id: PositionId) -> Result<Option<PositionEvent>, EngineError> {
        let Some(position) = self.portfolio().position(id) else {
            return Ok(None);
        };
        let strategy = position.strategy();
        let quantity = f64::from(position.quantity());

        let unit_value = if self.snapshot.date() >= strategy.expiration() {
            Ok(settlement_value(strategy, self.snapshot.price()))
        } else {
            price_strategy(strategy, &self.snapshot).map(|quote| quote.net_value)
        };
        let mark = match unit_value.map(|v| to_money("mark_value", v * quantity)) {
            Ok(Ok(mark)) => mark,
            Ok(Err(e)) => {
                warn!(position_id = %id, error = %e, "Mark not representable; keeping previous mark");
                observability::record_reprice_failure();
                return Ok(None);
            }
            Err(e) => {
                warn!(position_id = %id, error = %e, "Repricing failed; keeping previous mark");
                observability::record_reprice_failure();
                return Ok(None);
            }
        };

        let underlying = self.snapshot.price();
        let result = self.risk.mark(id, mark, underlying);
        self.ledger(result)?;
        Ok(self
            .portfolio()
            .position(id)
            .map(|p| PositionEvent::updated(p, self.snapshot.timestamp())))
    }

    fn apply_exit(&mut self, id: PositionId) -> Result<Option<TradeRecord>, EngineError> {
        let Some(position) = self.portfolio().position(id) else {
            return Ok(None);
        };
        let now = self.snapshot.timestamp();
        let Some(reason) = self.exits.evaluate(position, self.snapshot.date(), now) else {
            return Ok(None);
        };
        let result = self.risk.settle(id, reason, now);
        match self.ledger(result) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(position_id = %id, error = %e, "Exit failed; position stays open");
                Ok(None)
            }
        }
    }

    fn record_equity(&mut self) -> Decimal {
        let value = self.portfolio().equity();
        self.equity_curve.push(EquityPoint {
            timestamp: self.snapshot.timestamp(),
            value,
        });
        observability::set_equity(value.to_f64().unwrap_or_default());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{condor, scenario_snapshot, scenario_time};
    use crate::domain::{PositionState, RiskLevel, StrategyKind};
    use crate::risk::{PositionSizer, RiskLimits};
    use rust_decimal_macros::dec;

    fn engine(seed: u64) -> SimulationEngine {
        let risk = RiskManager::new(
            dec!(100000),
            PositionSizer::new(dec!(0.02)),
            RiskLimits {
                max_concurrent_positions: 5,
                allow_duplicate_symbols: true,
                naked_margin_rate: 0.2,
                min_confidence: 0.0,
                entry_windows: Vec::new(),
            },
        );
        SimulationEngine::new(
            risk,
            ExitPolicy::default(),
            PriceModel::new(seed),
            scenario_snapshot(),
            5,
        )
    }

    fn proposal() -> StrategyProposal {
        StrategyProposal {
            kind: StrategyKind::IronCondor,
            legs: condor().legs().to_vec(),
            rationale: "range-bound".to_string(),
            confidence: 0.8,
            risk_level: RiskLevel::Low,
        }
    }

    #[test]
    fn test_initial_equity_point() {
        let e = engine(1);
        assert_eq!(e.equity_curve().len(), 1);
        assert_eq!(e.equity_curve()[0].value, dec!(100000));
        assert_eq!(e.day(), 0);
    }

    #[test]
    fn test_first_day_admits_proposal() {
        let mut e = engine(1);
        let report = e.step(DayInput::simulated().with_proposal(Some(proposal()))).unwrap();
        assert_eq!(report.day, 1);
        assert!(!report.degraded);
        assert!(report.admission.as_ref().is_some_and(AdmissionDecision::is_admitted));
        assert_eq!(e.portfolio().open_count(), 1);
        assert!(matches!(e.events().last(), Some(PositionEvent::Opened { .. })));
        assert_eq!(e.equity_curve().len(), 2);
    }

    #[test]
    fn test_off_cadence_proposal_ignored() {
        let mut e = engine(1);
        e.step(DayInput::simulated()).unwrap();
        let report = e.step(DayInput::simulated().with_proposal(Some(proposal()))).unwrap();
        assert!(report.admission.is_none());
        assert_eq!(e.portfolio().open_count(), 0);
    }

    #[test]
    fn test_unavailable_day_is_degraded() {
        let mut e = engine(1);
        let report = e.step(DayInput::unavailable("timeout")).unwrap();
        assert!(report.degraded);
        assert_eq!(e.result().degraded_days, 1);
        assert!(report.timestamp > scenario_time());
    }

    #[test]
    fn test_observed_snapshot_overrides_model() {
        let mut e = engine(1);
        let observed = scenario_snapshot().evolve(151.25, scenario_time() + chrono::Duration::days(1));
        let report = e.step(DayInput::observed(observed.clone())).unwrap();
        assert!(!report.degraded);
        assert_eq!(e.snapshot(), &observed);

        let stale = scenario_snapshot();
        let report = e.step(DayInput::observed(stale)).unwrap();
        assert!(report.degraded);
    }

    #[test]
    fn test_position_expires_and_settles() {
        let mut e = engine(3);
        e.step(DayInput::simulated().with_proposal(Some(proposal()))).unwrap();
        // Wide exits so only expiration can close it
        e.exits = ExitPolicy {
            profit_target_pct: 100.0,
            stop_loss_pct: 100.0,
            time_exit_fraction: None,
        };
        for _ in 0..30 {
            e.step(DayInput::simulated()).unwrap();
        }
        let result = e.result();
        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.outcome, PositionState::ExpiredSettled);
        assert!(trade.timestamp.date_naive() >= condor().expiration());
        assert_eq!(e.portfolio().reserved(), Decimal::ZERO);
        assert!(e.portfolio().check_invariants().is_ok());
        // Settlement at intrinsic bounds the loss at 6 × 300
        assert!(trade.pnl >= dec!(-1800) && trade.pnl <= dec!(1200));
    }

    #[test]
    fn test_manual_close_and_not_found() {
        let mut e = engine(1);
        let report = e.step(DayInput::simulated().with_proposal(Some(proposal()))).unwrap();
        let Some(AdmissionDecision::Admitted(position)) = report.admission else {
            panic!("expected admission");
        };
        let record = e.close_position(position.id()).unwrap();
        assert_eq!(record.outcome, PositionState::ClosedManual);
        let err = e.close_position(position.id()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_seeded_runs_match() {
        let mut a = engine(9);
        let mut b = engine(9);
        let ra = a.run(40, |_| Some(proposal())).unwrap();
        let rb = b.run(40, |_| Some(proposal())).unwrap();
        let values = |r: &SimulationResult| r.equity_curve.iter().map(|p| p.value).collect::<Vec<_>>();
        assert_eq!(values(&ra), values(&rb));
        assert_eq!(ra.final_metrics, rb.final_metrics);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut e = engine(5);
        let first = e.run(10, |_| None).unwrap();
        e.reset();
        assert_eq!(e.day(), 0);
        assert_eq!(e.portfolio().cash(), dec!(100000));
        let second = e.run(10, |_| None).unwrap();
        assert_eq!(first.equity_curve, second.equity_curve);
    }

    #[test]
    fn test_halted_engine_refuses_work() {
        let mut e = engine(1);
        let violation = Err::<(), _>(LedgerError::NegativeCash { cash: dec!(-1) });
        assert!(e.ledger(violation).unwrap_err().is_fatal());
        assert!(e.is_halted());
        let err = e.step(DayInput::simulated()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Halted);
        e.reset();
        assert!(!e.is_halted());
        assert!(e.step(DayInput::simulated()).is_ok());
    }
}
