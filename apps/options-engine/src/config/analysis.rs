//! Analysis report settings.

use serde::{Deserialize, Serialize};

/// P&L curve settings; Monte Carlo sampling comes from the simulation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Points on the P&L curve.
    #[serde(default = "default_curve_points")]
    pub curve_points: usize,
    /// Curve half-width as a fraction of spot.
    #[serde(default = "default_curve_range")]
    pub curve_range: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            curve_points: default_curve_points(),
            curve_range: default_curve_range(),
        }
    }
}

const fn default_curve_points() -> usize {
    50
}

const fn default_curve_range() -> f64 {
    0.30
}
