//! # Kubernetes Events Exporter
//!
//! Watches `core/v1` Events and exports them as a single Prometheus counter:
//!
//! ```text
//! kube_events_total{type, involved_object_namespace, involved_object_kind, reason}
//! ```
//!
//! The counter reflects the true number of occurrences. That includes events
//! the API server deduplicated into a *series*, a single object whose
//! `series.count` keeps growing instead of one object per occurrence.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kube_events_exporter::prelude::*;
//! use kube::Client;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::try_default().await?;
//!     run_exporter(client, ExporterConfig::default(), CancellationToken::new()).await
//! }
//! ```
//!
//! ## Architecture
//!
//! 1. **Watch**: [`informer::EventInformer`] pumps a kube-rs watcher in the
//!    background and pairs each Event with its previous state
//! 2. **Aggregate**: [`aggregator::EventAggregator`] decides how many new
//!    occurrences each notification represents
//! 3. **Export**: [`collector::EventMetrics`] holds the counter and renders it
//!    for [`server`]
//!
//! ## Counting rules
//!
//! - Activity at or before exporter start is never counted
//! - The first sighting of an Event counts once
//! - Later updates count the growth of `series.count`, or of `count` for
//!   Events that are not deduplicated
//! - The first update carrying a `series` counts the whole series
//!
//! ## Modules
//!
//! - [`record`] - Projection of `core/v1` Events
//! - [`collector`] - `kube_events_total` registry adapter
//! - [`aggregator`] - Notification sink computing increments
//! - [`informer`] - Watch stream pump and identity cache
//! - [`filter`] - Allow-lists for Event types, namespaces, API groups and controllers
//! - [`server`] - `/metrics`, `/healthz`, `/readyz`
//! - [`telemetry`] - Exporter self-metrics
//! - [`config`] - Runtime configuration
//! - [`error`] - Error types

pub mod aggregator;
pub mod collector;
pub mod config;
pub mod error;
pub mod exporter;
pub mod filter;
pub mod informer;
pub mod record;
pub mod server;
pub mod telemetry;

pub mod prelude {
    //! Re-exports for convenient usage
    pub use crate::aggregator::{updated_occurrences, EventAggregator, NotificationSink};
    pub use crate::collector::{EventLabels, EventMetrics, SharedEventMetrics};
    pub use crate::config::ExporterConfig;
    pub use crate::error::{ExporterError, Result};
    pub use crate::exporter::run_exporter;
    pub use crate::filter::EventFilter;
    pub use crate::informer::EventInformer;
    pub use crate::record::{EventRecord, EventSeries, InvolvedObject};
    pub use crate::telemetry::{install_exporter_metrics, ExporterMetrics};
}
