//! Exporter self-telemetry
//!
//! Operational metrics about the exporter itself, recorded through the
//! `metrics` facade and served on their own listener so they never mix with
//! `kube_events_total`.
//!
//! - `kube_events_exporter_notifications_total{kind}` - watch notifications handled
//! - `kube_events_exporter_stale_notifications_total` - notifications older than process start
//! - `kube_events_exporter_negative_deltas_total` - updates whose counts went backwards
//! - `kube_events_exporter_filtered_events_total` - events rejected by the filter
//! - `kube_events_exporter_watch_errors_total` - errors surfaced by the watcher
//! - `kube_events_exporter_cached_events` - identities currently tracked

use crate::error::{ExporterError, Result};
use std::net::SocketAddr;
use tracing::info;

/// Metrics for the informer and aggregator
#[derive(Clone)]
pub struct ExporterMetrics {
    /// Add notifications delivered to the sink
    pub adds: metrics::Counter,
    /// Update notifications delivered to the sink
    pub updates: metrics::Counter,
    /// Delete notifications (cache evictions only)
    pub deletes: metrics::Counter,
    /// Notifications ignored because they predate process start
    pub stale: metrics::Counter,
    /// Updates with a negative computed delta
    pub negative_deltas: metrics::Counter,
    /// Events rejected by the event filter
    pub filtered: metrics::Counter,
    /// Watch stream errors
    pub watch_errors: metrics::Counter,
    /// Size of the identity cache
    pub cached_events: metrics::Gauge,
}

impl ExporterMetrics {
    /// Create exporter metrics
    pub fn new() -> Self {
        Self {
            adds: metrics::counter!("kube_events_exporter_notifications_total", "kind" => "add"),
            updates: metrics::counter!("kube_events_exporter_notifications_total", "kind" => "update"),
            deletes: metrics::counter!("kube_events_exporter_notifications_total", "kind" => "delete"),
            stale: metrics::counter!("kube_events_exporter_stale_notifications_total"),
            negative_deltas: metrics::counter!("kube_events_exporter_negative_deltas_total"),
            filtered: metrics::counter!("kube_events_exporter_filtered_events_total"),
            watch_errors: metrics::counter!("kube_events_exporter_watch_errors_total"),
            cached_events: metrics::gauge!("kube_events_exporter_cached_events"),
        }
    }
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the Prometheus recorder and serve self-metrics on `addr`.
///
/// Must run inside a tokio runtime; the exporter spawns its own listener task.
pub fn install_exporter_metrics(addr: SocketAddr) -> Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    info!(address = %addr, "Starting exporter metrics server");

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| ExporterError::TelemetryError(e.to_string()))
}
