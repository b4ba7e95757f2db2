//! Portfolio Simulation
//!
//! Discrete daily time-stepping over a single underlying:
//!
//! - `price_model`: seeded GBM and the business-day calendar
//! - `exits`: expiration, profit target, stop loss and time exit rules
//! - `input`: per-day market source and optional proposal
//! - `events`: position lifecycle events
//! - `engine`: `SimulationEngine`, the single writer of portfolio state
//! - `result`: equity curve, trades and `FinalMetrics`

pub mod engine;
pub mod events;
pub mod exits;
pub mod input;
pub mod price_model;
pub mod result;

pub use engine::{DayReport, SimulationEngine};
pub use events::PositionEvent;
pub use exits::ExitPolicy;
pub use input::{DayInput, MarketInput};
pub use price_model::{PriceModel, TRADING_DAYS_PER_YEAR, gbm_step, next_business_day, start_of_day};
pub use result::{EquityPoint, FinalMetrics, SimulationResult};
