// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Options Engine - Rust Core Library
//!
//! Analyzes multi-leg options strategies and simulates a portfolio of them
//! day by day.
//!
//! # Architecture
//!
//! ## Core (pure, no I/O)
//!
//! - **Domain**: contracts, legs, validated strategy templates, snapshots,
//!   chains, positions and selector proposals
//! - **Pricing**: Black-Scholes prices, Greeks and implied volatility
//! - **Analysis**: payoff geometry, breakevens, POP, analytic and Monte Carlo EV
//!
//! ## Stateful
//!
//! - **Ledger**: Decimal cash, margin and P&L books with invariant checks
//! - **Risk**: position sizing and admission control
//! - **Simulation**: the day-stepping engine, price model and exit rules
//!
//! ## Edges
//!
//! - **Application**: ports, the command controller and the live session
//! - **Infrastructure**: replay market data and strategy selectors
//! - **Config** / **Observability**: YAML settings, tracing and metrics

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Option contracts, strategies, snapshots and positions.
pub mod domain;

/// Black-Scholes pricing, Greeks and implied volatility.
pub mod pricing;

/// Strategy analysis reports.
pub mod analysis;

/// Portfolio books.
pub mod ledger;

/// Position sizing and admission control.
pub mod risk;

/// Day-stepping portfolio simulation.
pub mod simulation;

/// Ports, controller and live session.
pub mod application;

/// Port adapters.
pub mod infrastructure;

/// Configuration loading.
pub mod config;

/// Tracing and metrics.
pub mod observability;

/// Crate-level error type.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

pub use analysis::{AnalysisParams, AnalysisReport, Bound, Comparison, analyze, compare_strategies};
pub use application::{
    Command, CommandOutput, Controller, EventPublisherPort, LiveOutcome, LiveSession,
    LiveSettings, MarketDataPort, StrategySelectorPort,
};
pub use config::{Config, load_config, load_config_from_string};
pub use domain::{
    Leg, LegDirection, MarketSnapshot, OptionChain, OptionContract, OptionType, Position,
    PositionId, Strategy, StrategyKind, StrategyProposal,
};
pub use error::{EngineError, ErrorCode};
pub use infrastructure::marketdata::ReplayMarketData;
pub use infrastructure::selector::{ScriptedSelector, TemplateSelector};
pub use ledger::{Portfolio, TradeRecord};
pub use pricing::{Greeks, IvSolver, black_scholes, price};
pub use risk::{AdmissionDecision, RejectionReason, RiskManager};
pub use simulation::{DayInput, SimulationEngine, SimulationResult};
