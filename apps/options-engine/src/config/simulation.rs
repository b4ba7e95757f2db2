//! Simulation and backtest configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Portfolio simulation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Starting cash.
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    /// Fraction of equity that one position may lose at most.
    #[serde(default = "default_risk_per_trade")]
    pub risk_per_trade: f64,
    /// Open position cap.
    #[serde(default = "default_max_concurrent_positions")]
    pub max_concurrent_positions: usize,
    /// Trading days to simulate.
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    /// Request a proposal every this many trading days.
    #[serde(default = "default_trading_interval_days")]
    pub trading_interval_days: u32,
    /// Monte Carlo paths for EV.
    #[serde(default = "default_paths")]
    pub paths: u32,
    /// RNG seed for EV and price paths.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Underlying to simulate.
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Underlying price on the first day.
    #[serde(default = "default_initial_price")]
    pub initial_price: f64,
    /// Annualized risk-free rate.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Flat implied volatility of the starting snapshot.
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    /// First simulated date.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            risk_per_trade: default_risk_per_trade(),
            max_concurrent_positions: default_max_concurrent_positions(),
            horizon_days: default_horizon_days(),
            trading_interval_days: default_trading_interval_days(),
            paths: default_paths(),
            seed: default_seed(),
            symbol: default_symbol(),
            initial_price: default_initial_price(),
            risk_free_rate: default_risk_free_rate(),
            volatility: default_volatility(),
            start_date: default_start_date(),
        }
    }
}

const fn default_initial_capital() -> f64 {
    10_000.0
}

const fn default_risk_per_trade() -> f64 {
    0.02
}

const fn default_max_concurrent_positions() -> usize {
    5
}

const fn default_horizon_days() -> u32 {
    60
}

const fn default_trading_interval_days() -> u32 {
    5
}

const fn default_paths() -> u32 {
    10_000
}

const fn default_seed() -> u64 {
    42
}

fn default_symbol() -> String {
    "SPY".to_string()
}

const fn default_initial_price() -> f64 {
    450.0
}

const fn default_risk_free_rate() -> f64 {
    0.05
}

const fn default_volatility() -> f64 {
    0.20
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 2).unwrap_or_default()
}
