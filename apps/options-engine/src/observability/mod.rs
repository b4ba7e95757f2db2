//! Observability: tracing subscriber setup and metric recording.
//!
//! Metrics go through the `metrics` facade only. Installing an exporter is
//! left to the host process; without one every record call is a no-op.

mod metrics;
mod subscriber;

pub use metrics::{
    describe_metrics, record_admission, record_close, record_degraded_day, record_ledger_halt,
    record_rejection, record_reprice_failure, set_equity, set_open_positions,
};
pub use subscriber::{TracingInitError, init_tracing};
