//! Portfolio ledger.
//!
//! The `Portfolio` is the only mutable money state in the crate. Mutations are
//! crate-private and go through the risk manager and simulation engine.

pub mod error;
pub mod history;
pub mod portfolio;

pub use error::LedgerError;
pub use history::{ExitReason, LedgerEntry, TradeHistory, TradeRecord};
pub use portfolio::{Portfolio, to_money};
