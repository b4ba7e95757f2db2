//! Market Data Port (Driven Port)
//!
//! Interface for fetching snapshots and option chains from an external feed.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{MarketSnapshot, OptionChain};

/// Market data error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketDataError {
    /// Connection error.
    #[error("Market data connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },

    /// Symbol not found.
    #[error("Symbol not found: {symbol}")]
    SymbolNotFound {
        /// The unknown symbol.
        symbol: String,
    },

    /// No data for the requested day.
    #[error("Market data unavailable: {message}")]
    DataUnavailable {
        /// Error details.
        message: String,
    },

    /// The fetch did not complete in time.
    #[error("Market data request timed out after {timeout_ms} ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },
}

/// Port for fetching market data.
///
/// Implementations may be slow or fail; callers bound every call with a
/// timeout and treat failures as a degraded day.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Snapshot of `symbol` as of `date`.
    async fn snapshot(&self, symbol: &str, date: NaiveDate) -> Result<MarketSnapshot, MarketDataError>;

    /// Option chain of `symbol` as of `date`.
    async fn option_chain(&self, symbol: &str, date: NaiveDate) -> Result<OptionChain, MarketDataError>;
}
