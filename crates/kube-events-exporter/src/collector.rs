//! Prometheus registry adapter for `kube_events_total`
//!
//! Owns the counter schema and the read path used by the scrape endpoint.
//! The counter is a `CounterVec`; every label set gets its own atomic child,
//! so increments on unrelated labels do not serialize behind one lock.
//!
//! # Example
//!
//! ```rust,ignore
//! use kube_events_exporter::collector::{EventLabels, EventMetrics};
//!
//! let metrics = EventMetrics::new()?;
//! let labels = EventLabels::new("Warning", "shop", "Pod", "BackOff");
//! metrics.apply_increment(&labels, 1.0);
//!
//! let output = metrics.render()?;
//! ```

use crate::record::EventRecord;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tracing::warn;

/// Name of the exported counter
pub const EVENTS_TOTAL_NAME: &str = "kube_events_total";

/// Help text of the exported counter
pub const EVENTS_TOTAL_HELP: &str = "Count of all Kubernetes Events";

/// Label names of the exported counter, in the order values are passed
pub const EVENTS_TOTAL_LABELS: [&str; 4] = [
    "type",
    "involved_object_namespace",
    "involved_object_kind",
    "reason",
];

/// Label set identifying one `kube_events_total` series
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventLabels {
    pub event_type: String,
    pub involved_object_namespace: String,
    pub involved_object_kind: String,
    pub reason: String,
}

impl EventLabels {
    pub fn new(
        event_type: impl Into<String>,
        involved_object_namespace: impl Into<String>,
        involved_object_kind: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            involved_object_namespace: involved_object_namespace.into(),
            involved_object_kind: involved_object_kind.into(),
            reason: reason.into(),
        }
    }

    /// Label values in `EVENTS_TOTAL_LABELS` order
    pub fn values(&self) -> [&str; 4] {
        [
            &self.event_type,
            &self.involved_object_namespace,
            &self.involved_object_kind,
            &self.reason,
        ]
    }
}

impl From<&EventRecord> for EventLabels {
    fn from(record: &EventRecord) -> Self {
        Self::new(
            record.event_type.clone(),
            record.involved_object.namespace.clone(),
            record.involved_object.kind.clone(),
            record.reason.clone(),
        )
    }
}

/// Registry holding the `kube_events_total` counter
pub struct EventMetrics {
    registry: Registry,
    events_total: CounterVec,
}

impl EventMetrics {
    /// Create the counter in a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Create the counter and register it into an existing registry
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let events_total = CounterVec::new(
            Opts::new(EVENTS_TOTAL_NAME, EVENTS_TOTAL_HELP),
            &EVENTS_TOTAL_LABELS,
        )?;
        registry.register(Box::new(events_total.clone()))?;

        Ok(Self {
            registry,
            events_total,
        })
    }

    /// Metric descriptors: name, help and label names
    pub fn describe(&self) -> Vec<&Desc> {
        self.events_total.desc()
    }

    /// Snapshot of every labeled counter value
    pub fn collect(&self) -> Vec<MetricFamily> {
        self.events_total.collect()
    }

    /// Add `magnitude` occurrences to the series identified by `labels`.
    ///
    /// A zero magnitude is a no-op and does not create the series. Callers must
    /// never pass a negative magnitude; one that slips through is logged and
    /// dropped so the counter stays monotonic.
    pub fn apply_increment(&self, labels: &EventLabels, magnitude: f64) {
        if magnitude < 0.0 || magnitude.is_nan() {
            warn!(
                magnitude,
                event_type = %labels.event_type,
                namespace = %labels.involved_object_namespace,
                kind = %labels.involved_object_kind,
                reason = %labels.reason,
                "Refusing to apply negative increment"
            );
            return;
        }
        if magnitude == 0.0 {
            return;
        }

        self.events_total
            .with_label_values(&labels.values())
            .inc_by(magnitude);
    }

    /// Current value of one series, `None` if it was never incremented.
    ///
    /// Reads from a collected snapshot, so looking up an absent series does not
    /// create it.
    pub fn counter_value(&self, labels: &EventLabels) -> Option<f64> {
        let wanted = labels.values();
        self.collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                EVENTS_TOTAL_LABELS
                    .iter()
                    .zip(wanted.iter())
                    .all(|(name, value)| {
                        metric
                            .get_label()
                            .iter()
                            .any(|pair| pair.get_name() == *name && pair.get_value() == *value)
                    })
            })
            .map(|metric| metric.get_counter().get_value())
    }

    /// Number of label sets seen so far
    pub fn series_count(&self) -> usize {
        self.collect()
            .iter()
            .map(|family| family.get_metric().len())
            .sum()
    }

    /// Render the registry in Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Get the underlying Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Collector for EventMetrics {
    fn desc(&self) -> Vec<&Desc> {
        self.describe()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        EventMetrics::collect(self)
    }
}

/// Shared metrics handle for the aggregator and the scrape endpoint
pub type SharedEventMetrics = Arc<EventMetrics>;
