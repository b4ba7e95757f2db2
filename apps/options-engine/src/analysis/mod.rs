//! Strategy Analysis
//!
//! Static analysis of a strategy against a market snapshot:
//!
//! - `payoff`: expiration payoff geometry (extremes, breakevens, P&L curve)
//! - `probability`: lognormal terminal distribution, POP and closed-form EV
//! - `monte_carlo`: seeded Monte Carlo EV with standard error
//! - `report`: `AnalysisReport` and `Recommendation`
//! - `analyzer`: `analyze` and parallel `compare_strategies`
//!
//! All functions are pure and may run concurrently across strategies.

pub mod analyzer;
pub mod monte_carlo;
pub mod payoff;
pub mod probability;
pub mod report;

pub use analyzer::{AnalysisParams, Comparison, ComparisonFailure, analyze, compare_strategies};
pub use monte_carlo::{EvEstimate, expected_value};
pub use payoff::{Bound, PnlPoint, breakevens, breakpoints, max_loss, max_profit, pnl_curve};
pub use probability::{Lognormal, analytic_expected_value, probability_of_profit};
pub use report::{AnalysisReport, MarketConditions, Recommendation, Sentiment};
