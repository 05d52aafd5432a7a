//! Event Records
//!
//! A read-only projection of `core/v1` Events holding only the fields the
//! aggregator and filter look at. Missing strings become empty and missing
//! counts become zero, mirroring how the API server's zero values behave.

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;

/// Deduplicated series state of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSeries {
    /// Number of occurrences in this series up to `last_observed_time`
    pub count: i32,
    /// Time of the last occurrence observed
    pub last_observed_time: Option<DateTime<Utc>>,
}

/// The object an event is about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvolvedObject {
    pub namespace: String,
    pub kind: String,
    pub api_version: String,
}

impl InvolvedObject {
    /// API group of the involved object, empty for the core group
    pub fn api_group(&self) -> &str {
        match self.api_version.split_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }
}

/// Snapshot of one Event object as delivered by the watch stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecord {
    pub uid: Option<String>,
    pub name: String,
    pub namespace: String,
    pub event_type: String,
    pub involved_object: InvolvedObject,
    pub reason: String,
    pub count: i32,
    pub series: Option<EventSeries>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub reporting_controller: String,
}

impl EventRecord {
    /// Stable identity of the underlying Event object.
    ///
    /// Uses the object UID and falls back to `namespace/name` for objects that
    /// were never persisted.
    pub fn identity(&self) -> String {
        match &self.uid {
            Some(uid) if !uid.is_empty() => uid.clone(),
            _ => format!("{}/{}", self.namespace, self.name),
        }
    }

    /// Time of the most recent occurrence represented by this record
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.series
            .as_ref()
            .and_then(|series| series.last_observed_time)
            .or(self.last_timestamp)
    }
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        let involved = &event.involved_object;
        let reporting_controller = event
            .reporting_component
            .clone()
            .filter(|c| !c.is_empty())
            .or_else(|| event.source.as_ref().and_then(|s| s.component.clone()))
            .unwrap_or_default();

        Self {
            uid: event.metadata.uid.clone(),
            name: event.metadata.name.clone().unwrap_or_default(),
            namespace: event.metadata.namespace.clone().unwrap_or_default(),
            event_type: event.type_.clone().unwrap_or_default(),
            involved_object: InvolvedObject {
                namespace: involved.namespace.clone().unwrap_or_default(),
                kind: involved.kind.clone().unwrap_or_default(),
                api_version: involved.api_version.clone().unwrap_or_default(),
            },
            reason: event.reason.clone().unwrap_or_default(),
            count: event.count.unwrap_or_default(),
            series: event.series.as_ref().map(|series| EventSeries {
                count: series.count.unwrap_or_default(),
                last_observed_time: series.last_observed_time.as_ref().map(|t| t.0),
            }),
            last_timestamp: event.last_timestamp.as_ref().map(|t| t.0),
            reporting_controller,
        }
    }
}
