//! Engine counters and gauges.
//!
//! # Example
//!
//! ```ignore
//! use options_engine::observability::{describe_metrics, record_admission};
//!
//! describe_metrics();
//! record_admission("IRON_CONDOR", 2);
//! ```

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register descriptions for every metric the engine emits.
pub fn describe_metrics() {
    describe_counter!(
        "options_engine_admissions_total",
        "Positions admitted, by strategy kind"
    );
    describe_counter!(
        "options_engine_admitted_units_total",
        "Strategy units admitted, by strategy kind"
    );
    describe_counter!(
        "options_engine_rejections_total",
        "Admission rejections, by reason"
    );
    describe_counter!(
        "options_engine_closes_total",
        "Positions closed, by outcome and exit reason"
    );
    describe_counter!(
        "options_engine_reprice_failures_total",
        "Positions whose daily repricing failed"
    );
    describe_counter!(
        "options_engine_degraded_days_total",
        "Simulated days that fell back to the price model"
    );
    describe_counter!(
        "options_engine_ledger_halts_total",
        "Ledger invariant violations that halted the engine"
    );
    describe_gauge!("options_engine_open_positions", "Open positions");
    describe_gauge!("options_engine_equity", "Portfolio equity");
}

/// Record an admitted position.
pub fn record_admission(kind: &'static str, quantity: u32) {
    counter!("options_engine_admissions_total", "kind" => kind).increment(1);
    counter!("options_engine_admitted_units_total", "kind" => kind)
        .increment(u64::from(quantity));
}

/// Record a rejected admission.
pub fn record_rejection(reason: &'static str) {
    counter!("options_engine_rejections_total", "reason" => reason).increment(1);
}

/// Record a position reaching a terminal state.
pub fn record_close(outcome: String, exit_reason: &'static str) {
    counter!(
        "options_engine_closes_total",
        "outcome" => outcome,
        "exit_reason" => exit_reason
    )
    .increment(1);
}

/// Record a failed daily repricing.
pub fn record_reprice_failure() {
    counter!("options_engine_reprice_failures_total").increment(1);
}

/// Record a day simulated without a live snapshot.
pub fn record_degraded_day() {
    counter!("options_engine_degraded_days_total").increment(1);
}

/// Record an engine halt.
pub fn record_ledger_halt() {
    counter!("options_engine_ledger_halts_total").increment(1);
}

/// Update the open position gauge.
pub fn set_open_positions(count: usize) {
    gauge!("options_engine_open_positions").set(count as f64);
}

/// Update the equity gauge.
pub fn set_equity(equity: f64) {
    gauge!("options_engine_equity").set(equity);
}
