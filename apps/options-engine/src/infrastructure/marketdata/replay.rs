//! Replays recorded snapshots and chains keyed by date.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::application::ports::{MarketDataError, MarketDataPort};
use crate::domain::{MarketSnapshot, OptionChain};

/// In-memory feed for one underlying. Dates without a recording are unavailable.
#[derive(Debug, Clone, Default)]
pub struct ReplayMarketData {
    symbol: String,
    snapshots: HashMap<NaiveDate, MarketSnapshot>,
    chains: HashMap<NaiveDate, OptionChain>,
}

impl ReplayMarketData {
    /// Empty feed for `symbol`.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Record a snapshot under its own date.
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: MarketSnapshot) -> Self {
        self.snapshots.insert(snapshot.date(), snapshot);
        self
    }

    /// Record a chain for `date`.
    #[must_use]
    pub fn with_chain(mut self, date: NaiveDate, chain: OptionChain) -> Self {
        self.chains.insert(date, chain);
        self
    }

    /// Number of recorded snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn check_symbol(&self, symbol: &str) -> Result<(), MarketDataError> {
        if symbol == self.symbol {
            Ok(())
        } else {
            Err(MarketDataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }
    }
}

#[async_trait]
impl MarketDataPort for ReplayMarketData {
    async fn snapshot(&self, symbol: &str, date: NaiveDate) -> Result<MarketSnapshot, MarketDataError> {
        self.check_symbol(symbol)?;
        self.snapshots
            .get(&date)
            .cloned()
            .ok_or_else(|| MarketDataError::DataUnavailable {
                message: format!("no snapshot for {symbol} on {date}"),
            })
    }

    async fn option_chain(&self, symbol: &str, date: NaiveDate) -> Result<OptionChain, MarketDataError> {
        self.check_symbol(symbol)?;
        self.chains
            .get(&date)
            .cloned()
            .ok_or_else(|| MarketDataError::DataUnavailable {
                message: format!("no option chain for {symbol} on {date}"),
            })
    }
}
