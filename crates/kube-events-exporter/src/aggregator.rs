//! Event Aggregator
//!
//! Turns add/update notifications for Event objects into increments of
//! `kube_events_total`. Two rules keep the counter honest:
//!
//! 1. Only activity strictly after process start is counted. The initial list
//!    replays every Event still stored by the API server, and none of that
//!    history belongs to this process.
//! 2. Updates contribute the number of occurrences that are new since the
//!    previous state. Deduplicated events carry their count in `series`, so the
//!    delta is taken from `series.count` once the series exists.
//!
//! An add always contributes exactly one occurrence, even when the first state
//! seen already carries a larger `count` or `series.count`. Part of that count
//! may predate process start, and the add has no prior state to subtract from.
//! An Event first seen mid-series is therefore undercounted.

use crate::collector::{EventLabels, SharedEventMetrics};
use crate::record::EventRecord;
use crate::telemetry::ExporterMetrics;
use chrono::{DateTime, Utc};
use tracing::{trace, warn};

/// Receiver of Event notifications from an informer.
///
/// Handlers are invoked concurrently for different Event identities. For a
/// single identity the add always precedes its updates and updates never
/// overlap.
pub trait NotificationSink: Send + Sync {
    /// First time an Event identity is observed
    fn on_add(&self, record: &EventRecord);

    /// A previously observed Event identity changed
    fn on_update(&self, old: &EventRecord, new: &EventRecord);
}

/// Aggregates Event notifications into `kube_events_total`
pub struct EventAggregator {
    started_at: DateTime<Utc>,
    metrics: SharedEventMetrics,
    telemetry: ExporterMetrics,
}

impl EventAggregator {
    /// Create an aggregator counting from now.
    ///
    /// Construct it before starting the informer so the cutoff precedes the
    /// first delivered notification.
    pub fn new(metrics: SharedEventMetrics) -> Self {
        Self::with_start_time(metrics, Utc::now())
    }

    /// Create an aggregator with an explicit cutoff
    pub fn with_start_time(metrics: SharedEventMetrics, started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            metrics,
            telemetry: ExporterMetrics::new(),
        }
    }

    /// Process start cutoff
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Registry this aggregator writes to
    pub fn metrics(&self) -> &SharedEventMetrics {
        &self.metrics
    }

    /// Whether the record's last activity happened strictly after start.
    ///
    /// A record without any activity time is treated as the zero time.
    pub fn is_after_start(&self, record: &EventRecord) -> bool {
        record
            .last_activity()
            .is_some_and(|last| last > self.started_at)
    }

    fn increase(&self, record: &EventRecord, occurrences: i64) {
        self.metrics
            .apply_increment(&EventLabels::from(record), occurrences as f64);
    }
}

/// Number of occurrences an update adds on top of the previous state.
///
/// Events are first written without `series`; when the API server starts
/// deduplicating, the first series count covers every occurrence so far.
pub fn updated_occurrences(old: &EventRecord, new: &EventRecord) -> i64 {
    match (&old.series, &new.series) {
        (Some(old_series), Some(new_series)) => {
            i64::from(new_series.count) - i64::from(old_series.count)
        }
        (None, Some(new_series)) => i64::from(new_series.count),
        (_, None) => i64::from(new.count) - i64::from(old.count),
    }
}

impl NotificationSink for EventAggregator {
    fn on_add(&self, record: &EventRecord) {
        if !self.is_after_start(record) {
            self.telemetry.stale.increment(1);
            trace!(event = %record.identity(), "Ignoring Event predating exporter start");
            return;
        }

        self.increase(record, 1);
    }

    fn on_update(&self, old: &EventRecord, new: &EventRecord) {
        if !self.is_after_start(new) {
            self.telemetry.stale.increment(1);
            trace!(event = %new.identity(), "Ignoring Event update predating exporter start");
            return;
        }

        let occurrences = updated_occurrences(old, new);
        if occurrences < 0 {
            self.telemetry.negative_deltas.increment(1);
            warn!(
                event = %new.identity(),
                namespace = %new.namespace,
                reason = %new.reason,
                old_count = old.count,
                new_count = new.count,
                old_series_count = old.series.as_ref().map(|s| s.count),
                new_series_count = new.series.as_ref().map(|s| s.count),
                "Event occurrence count decreased, skipping update"
            );
            return;
        }

        self.increase(new, occurrences);
    }
}
