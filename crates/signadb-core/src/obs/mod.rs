//! Observability: engine telemetry and sink abstractions.
//!
//! Engine logic must not touch `obs::metrics` directly; all instrumentation
//! flows through [`sink::EngineEvent`] and [`sink::MetricsSink`].

pub mod metrics;
pub mod sink;

pub use metrics::MetricsReport;
pub use sink::{EngineEvent, MetricsSink};

/// Snapshot the process-local metrics state.
#[must_use]
pub fn metrics_report() -> MetricsReport {
    metrics::report()
}

/// Reset the process-local metrics state. Intended for tests and the
/// maintenance console.
pub fn metrics_reset() {
    metrics::reset();
}
