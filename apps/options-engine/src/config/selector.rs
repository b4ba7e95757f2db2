//! Template strategy selector settings.

use serde::{Deserialize, Serialize};

use crate::domain::StrategyKind;

/// How the built-in selector lays out strikes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Kinds to rotate through, in order.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<StrategyKind>,
    /// Iron condor strikes as fractions of spot: long put, short put, short call, long call.
    #[serde(default = "default_condor_offsets")]
    pub condor_offsets: [f64; 4],
    /// Distance of wings and spread legs from spot, as a fraction.
    #[serde(default = "default_wing_offset")]
    pub wing_offset: f64,
    /// Strikes are rounded to this increment.
    #[serde(default = "default_strike_increment")]
    pub strike_increment: f64,
    /// Minimum calendar days to the chosen expiration.
    #[serde(default = "default_days_to_expiry")]
    pub days_to_expiry: i64,
    /// Minimum calendar days to expiration for straddles and strangles.
    #[serde(default = "default_long_vol_days_to_expiry")]
    pub long_vol_days_to_expiry: i64,
    /// Confidence attached to generated proposals.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            kinds: default_kinds(),
            condor_offsets: default_condor_offsets(),
            wing_offset: default_wing_offset(),
            strike_increment: default_strike_increment(),
            days_to_expiry: default_days_to_expiry(),
            long_vol_days_to_expiry: default_long_vol_days_to_expiry(),
            confidence: default_confidence(),
        }
    }
}

fn default_kinds() -> Vec<StrategyKind> {
    vec![StrategyKind::IronCondor]
}

const fn default_condor_offsets() -> [f64; 4] {
    [0.90, 0.95, 1.05, 1.10]
}

const fn default_wing_offset() -> f64 {
    0.05
}

const fn default_strike_increment() -> f64 {
    1.0
}

const fn default_days_to_expiry() -> i64 {
    37
}

const fn default_long_vol_days_to_expiry() -> i64 {
    21
}

const fn default_confidence() -> f64 {
    0.7
}
