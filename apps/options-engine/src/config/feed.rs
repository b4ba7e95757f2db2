//! External data feed settings for live mode.

use serde::{Deserialize, Serialize};

/// Timeouts and hand-off queue sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Per-call timeout for market data and selector requests.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Capacity of the producer to decision-loop queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

const fn default_timeout_ms() -> u64 {
    5000
}

const fn default_queue_capacity() -> usize {
    32
}
