//! Early exit thresholds.

use serde::{Deserialize, Serialize};

/// Profit target and stop loss as fractions of the position's max risk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitConfig {
    /// Close once unrealized P&L reaches this share of max profit.
    #[serde(default = "default_pct")]
    pub profit_target_pct: f64,
    /// Close once unrealized loss reaches this share of max loss.
    #[serde(default = "default_pct")]
    pub stop_loss_pct: f64,
    /// Close once this share of the entry time to expiry has elapsed; `null` disables.
    #[serde(default = "default_time_exit_fraction")]
    pub time_exit_fraction: Option<f64>,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            profit_target_pct: default_pct(),
            stop_loss_pct: default_pct(),
            time_exit_fraction: default_time_exit_fraction(),
        }
    }
}

const fn default_pct() -> f64 {
    0.5
}

#[allow(clippy::unnecessary_wraps)] // serde default must match the field type
const fn default_time_exit_fraction() -> Option<f64> {
    Some(0.5)
}
