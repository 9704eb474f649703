//! Telemetry module
//!
//! Structured logging to stderr and Prometheus metrics

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{
    observe_http_request, record_fetch_planned, records_emitted, records_indexed,
};

use crate::config::TelemetryConfig;

/// Guard that keeps telemetry alive for the process lifetime
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize logging and the metrics exporter.
///
/// Must run inside a tokio runtime when a metrics port is configured; the
/// exporter spawns its listener on the current runtime.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    init_logging(&config.log_level)?;

    if config.metrics_port > 0 {
        metrics::init_exporter(config.metrics_port)?;
    }

    Ok(TelemetryGuard { _priv: () })
}
