//! Command dispatch for the engine.
//!
//! Every interaction is a [`Command`] value; the controller routes it to the
//! analyzer or the simulation engine and returns a [`CommandOutput`]. Portfolio
//! state is only reached through engine operations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{AnalysisParams, AnalysisReport, Comparison, analyze, compare_strategies};
use crate::config::Config;
use crate::domain::{MarketSnapshot, Position, PositionId, Strategy, StrategyProposal};
use crate::error::EngineError;
use crate::infrastructure::selector::TemplateSelector;
use crate::ledger::{Portfolio, TradeRecord};
use crate::risk::AdmissionDecision;
use crate::simulation::{DayInput, DayReport, SimulationEngine, SimulationResult};

/// A request to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Analyze one strategy.
    Analyze {
        /// Strategy to analyze.
        strategy: Strategy,
        /// Market state to analyze against.
        snapshot: MarketSnapshot,
    },
    /// Analyze several strategies and rank them by EV.
    Compare {
        /// Candidates.
        strategies: Vec<Strategy>,
        /// Market state shared by all candidates.
        snapshot: MarketSnapshot,
    },
    /// Submit a proposal for admission at the current snapshot.
    Submit {
        /// Candidate strategy.
        proposal: StrategyProposal,
    },
    /// Advance one day.
    Step {
        /// The day's market data and proposal.
        input: DayInput,
    },
    /// Run model-driven days, proposing with the built-in selector.
    RunBacktest {
        /// Days to run.
        days: u32,
    },
    /// Close an open position at the current mark.
    ClosePosition {
        /// Position to close.
        id: PositionId,
    },
    /// Current portfolio state.
    Portfolio,
    /// Closed trades.
    TradeHistory,
    /// Restore the initial state.
    Reset,
}

impl Command {
    /// Label for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Analyze { .. } => "ANALYZE",
            Self::Compare { .. } => "COMPARE",
            Self::Submit { .. } => "SUBMIT",
            Self::Step { .. } => "STEP",
            Self::RunBacktest { .. } => "RUN_BACKTEST",
            Self::ClosePosition { .. } => "CLOSE_POSITION",
            Self::Portfolio => "PORTFOLIO",
            Self::TradeHistory => "TRADE_HISTORY",
            Self::Reset => "RESET",
        }
    }
}

/// Portfolio totals and open positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Unreserved cash.
    pub cash: Decimal,
    /// Margin held against open positions.
    pub reserved: Decimal,
    /// Credits held until their positions close.
    pub unearned_premium: Decimal,
    /// Realized P&L.
    pub realized_pnl: Decimal,
    /// Unrealized P&L.
    pub unrealized_pnl: Decimal,
    /// Cash + reserved + unearned premium + open marks.
    pub equity: Decimal,
    /// Open positions.
    pub positions: Vec<Position>,
}

impl From<&Portfolio> for PortfolioSummary {
    fn from(portfolio: &Portfolio) -> Self {
        Self {
            cash: portfolio.cash(),
            reserved: portfolio.reserved(),
            unearned_premium: portfolio.unearned_premium(),
            realized_pnl: portfolio.realized_pnl(),
            unrealized_pnl: portfolio.unrealized_pnl(),
            equity: portfolio.equity(),
            positions: portfolio.positions().to_vec(),
        }
    }
}

/// Result of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandOutput {
    /// Single strategy report.
    Analysis(Box<AnalysisReport>),
    /// Ranked reports.
    Comparison(Comparison),
    /// Admission outcome.
    Admission(AdmissionDecision),
    /// One day's report.
    Day(Box<DayReport>),
    /// Backtest result.
    Backtest(Box<SimulationResult>),
    /// Closed trade.
    Closed(TradeRecord),
    /// Portfolio state.
    Portfolio(PortfolioSummary),
    /// Closed trades, oldest first.
    TradeHistory(Vec<TradeRecord>),
    /// State restored.
    Reset,
}

/// Routes commands to the analyzer and the engine.
#[derive(Debug)]
pub struct Controller {
    engine: SimulationEngine,
    params: AnalysisParams,
    selector: Option<TemplateSelector>,
}

impl Controller {
    /// Controller without a backtest selector; `RunBacktest` proposes nothing.
    #[must_use]
    pub const fn new(engine: SimulationEngine, params: AnalysisParams) -> Self {
        Self {
            engine,
            params,
            selector: None,
        }
    }

    /// Use `selector` for `RunBacktest` proposals.
    #[must_use]
    pub fn with_selector(mut self, selector: TemplateSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Controller, engine and selector built from configuration.
    ///
    /// # Errors
    ///
    /// Returns a `CONFIG` error if the engine cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let engine = SimulationEngine::from_config(config)?;
        let params = AnalysisParams::from_config(&config.simulation, &config.analysis);
        Ok(Self::new(engine, params).with_selector(TemplateSelector::new(config.selector.clone())))
    }

    /// The engine.
    #[must_use]
    pub const fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    /// Analysis settings.
    #[must_use]
    pub const fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Execute a command.
    ///
    /// # Errors
    ///
    /// `PRICING` when a single analysis cannot price its strategy, plus
    /// whatever the engine operation returns (`HALTED`, `NOT_FOUND`,
    /// `LEDGER_INVARIANT`). Rejected admissions are outputs, not errors.
    pub fn dispatch(&mut self, command: Command) -> Result<CommandOutput, EngineError> {
        debug!(command = command.name(), "Dispatching command");
        match command {
            Command::Analyze { strategy, snapshot } => {
                let report = analyze(&strategy, &snapshot, &self.params)?;
                Ok(CommandOutput::Analysis(Box::new(report)))
            }
            Command::Compare {
                strategies,
                snapshot,
            } => Ok(CommandOutput::Comparison(compare_strategies(
                &strategies,
                &snapshot,
                &self.params,
            ))),
            Command::Submit { proposal } => self.engine.submit(proposal).map(CommandOutput::Admission),
            Command::Step { input } => self
                .engine
                .step(input)
                .map(|report| CommandOutput::Day(Box::new(report))),
            Command::RunBacktest { days } => {
                let selector = self.selector.as_ref();
                let result = self
                    .engine
                    .run(days, |snapshot| selector.and_then(|s| s.select(snapshot, None)))?;
                Ok(CommandOutput::Backtest(Box::new(result)))
            }
            Command::ClosePosition { id } => self.engine.close_position(id).map(CommandOutput::Closed),
            Command::Portfolio => Ok(CommandOutput::Portfolio(self.engine.portfolio().into())),
            Command::TradeHistory => Ok(CommandOutput::TradeHistory(
                self.engine.portfolio().history().trades().cloned().collect(),
            )),
            Command::Reset => {
                self.engine.reset();
                if let Some(selector) = &self.selector {
                    selector.reset();
                }
                Ok(CommandOutput::Reset)
            }
        }
    }
}
