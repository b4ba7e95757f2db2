//! Option chain as delivered by a market-data collaborator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::contract::OptionType;

/// One quoted contract in a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainQuote {
    /// Expiration date.
    pub expiration: NaiveDate,
    /// Strike price.
    pub strike: f64,
    /// Call or put.
    pub option_type: OptionType,
    /// Mid premium per share.
    pub premium: f64,
    /// Quoted implied volatility, if the feed supplies one.
    #[serde(default)]
    pub implied_volatility: Option<f64>,
}

/// Quotes for one underlying across expirations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    symbol: String,
    expirations: Vec<NaiveDate>,
    quotes: Vec<ChainQuote>,
}

impl OptionChain {
    /// Build a chain. Expirations are derived from the quotes when `expirations` is empty.
    #[must_use]
    pub fn new(symbol: impl Into<String>, expirations: Vec<NaiveDate>, quotes: Vec<ChainQuote>) -> Self {
        let mut expirations = if expirations.is_empty() {
            quotes.iter().map(|q| q.expiration).collect()
        } else {
            expirations
        };
        expirations.sort_unstable();
        expirations.dedup();
        Self {
            symbol: symbol.into(),
            expirations,
            quotes,
        }
    }

    /// Underlying symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Listed expirations, ascending.
    #[must_use]
    pub fn expirations(&self) -> &[NaiveDate] {
        &self.expirations
    }

    /// All quotes.
    #[must_use]
    pub fn quotes(&self) -> &[ChainQuote] {
        &self.quotes
    }

    /// First expiration at least `min_days` after `from`.
    #[must_use]
    pub fn expiration_after(&self, from: NaiveDate, min_days: i64) -> Option<NaiveDate> {
        self.expirations
            .iter()
            .copied()
            .find(|e| (*e - from).num_days() >= min_days)
    }

    /// Distinct strikes listed for an expiration, ascending.
    #[must_use]
    pub fn strikes(&self, expiration: NaiveDate) -> Vec<f64> {
        let mut strikes: Vec<f64> = self
            .quotes
            .iter()
            .filter(|q| q.expiration == expiration)
            .map(|q| q.strike)
            .collect();
        strikes.sort_by(f64::total_cmp);
        strikes.dedup();
        strikes
    }

    /// Listed strike closest to `target` for an expiration.
    #[must_use]
    pub fn nearest_strike(&self, expiration: NaiveDate, target: f64) -> Option<f64> {
        self.strikes(expiration)
            .into_iter()
            .min_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()))
    }

    /// Quote for an exact expiration, strike and type.
    #[must_use]
    pub fn quote(
        &self,
        expiration: NaiveDate,
        strike: f64,
        option_type: OptionType,
    ) -> Option<&ChainQuote> {
        self.quotes.iter().find(|q| {
            q.expiration == expiration && q.strike == strike && q.option_type == option_type
        })
    }

    /// Premium for an exact expiration, strike and type.
    #[must_use]
    pub fn premium(&self, expiration: NaiveDate, strike: f64, option_type: OptionType) -> Option<f64> {
        self.quote(expiration, strike, option_type).map(|q| q.premium)
    }
}
