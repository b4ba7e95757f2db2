//! Admission control settings.

use serde::{Deserialize, Serialize};

use crate::domain::StrategyKind;

/// Calendar days to expiry at which a strategy kind may be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryWindow {
    /// Strategy kind the window applies to.
    pub kind: StrategyKind,
    /// Inclusive lower bound.
    pub min_days: i64,
    /// Inclusive upper bound.
    pub max_days: i64,
}

impl EntryWindow {
    /// Whether `days` to expiry falls inside the window.
    #[must_use]
    pub const fn contains(&self, days: i64) -> bool {
        days >= self.min_days && days <= self.max_days
    }
}

/// Risk manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Allow more than one open position per underlying.
    #[serde(default = "default_true")]
    pub allow_duplicate_symbols: bool,
    /// Naked short margin as a fraction of the underlying notional.
    #[serde(default = "default_naked_margin_rate")]
    pub naked_margin_rate: f64,
    /// Proposals below this confidence are skipped.
    #[serde(default)]
    pub min_confidence: f64,
    /// Days-to-expiry windows by kind. Kinds without a window are unrestricted.
    #[serde(default = "default_entry_windows")]
    pub entry_windows: Vec<EntryWindow>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            allow_duplicate_symbols: true,
            naked_margin_rate: default_naked_margin_rate(),
            min_confidence: 0.0,
            entry_windows: default_entry_windows(),
        }
    }
}

pub(crate) const fn default_true() -> bool {
    true
}

const fn default_naked_margin_rate() -> f64 {
    0.20
}

fn default_entry_windows() -> Vec<EntryWindow> {
    let window = |kind, min_days, max_days| EntryWindow {
        kind,
        min_days,
        max_days,
    };
    vec![
        window(StrategyKind::IronCondor, 30, 45),
        window(StrategyKind::Straddle, 15, 30),
        window(StrategyKind::Strangle, 15, 30),
    ]
}
