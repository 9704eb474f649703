//! Prometheus metrics
//!
//! Counters and histograms land in the monitoring backend via the
//! Prometheus exporter. Every series carries an `env` label when the ENV
//! environment variable is set, so staging and production runs separate
//! cleanly.

use metrics::Label;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Start the Prometheus scrape endpoint.
pub fn init_exporter(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;
    tracing::info!(port, "Metrics exporter listening");
    Ok(())
}

fn with_env(mut labels: Vec<Label>) -> Vec<Label> {
    if let Ok(env) = std::env::var("ENV") {
        labels.push(Label::new("env", env));
    }
    labels
}

/// Count records emitted by a tap stream.
pub fn records_emitted(stream: &str, count: u64) {
    let labels = with_env(vec![Label::new("stream", stream.to_string())]);
    metrics::counter!("fintap_records_emitted_total", labels).increment(count);
}

/// Count records written to the search index.
pub fn records_indexed(index: &str, count: u64) {
    let labels = with_env(vec![Label::new("index", index.to_string())]);
    metrics::counter!("fintap_records_indexed_total", labels).increment(count);
}

/// Count fetch-window decisions per stream (`plan` is "incremental" or "full").
pub fn record_fetch_planned(stream: &str, plan: &'static str) {
    let labels = with_env(vec![
        Label::new("stream", stream.to_string()),
        Label::new("plan", plan),
    ]);
    metrics::counter!("fintap_fetches_planned_total", labels).increment(1);
}

/// Time one HTTP request and count it by status class.
pub fn observe_http_request(endpoint: &'static str, status: &'static str, duration: Duration) {
    let labels = with_env(vec![
        Label::new("endpoint", endpoint),
        Label::new("status", status),
    ]);
    metrics::counter!("fintap_http_requests_total", labels.clone()).increment(1);
    metrics::histogram!("fintap_http_request_duration_seconds", labels)
        .record(duration.as_secs_f64());
}
