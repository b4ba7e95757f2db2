//! Risk Management
//!
//! Position sizing and admission control. `RiskManager` is the only writer of
//! the portfolio ledger.

pub mod manager;
pub mod sizing;

pub use manager::{AdmissionDecision, RejectionReason, RiskLimits, RiskManager, risk_profile};
pub use sizing::{PositionSizer, SizingError, SizingInput, SizingResult};
