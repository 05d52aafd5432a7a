//! Exporter wiring
//!
//! Builds the registry, aggregator, informer and HTTP endpoint and runs them
//! until shutdown. Startup order matters: the endpoint is served before the
//! feed starts so scrapes see an empty registry rather than an error, and the
//! aggregator's start time is captured before the informer delivers anything.

use crate::aggregator::EventAggregator;
use crate::collector::EventMetrics;
use crate::config::ExporterConfig;
use crate::error::{ExporterError, Result};
use crate::informer::EventInformer;
use crate::server::{self, ServerState};
use k8s_openapi::api::core::v1::Event;
use kube::{Api, Client};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the exporter until `token` is cancelled or the endpoint fails
pub async fn run_exporter(
    client: Client,
    config: ExporterConfig,
    token: CancellationToken,
) -> Result<()> {
    config.validate()?;

    let metrics = Arc::new(EventMetrics::new()?);

    let aggregator = Arc::new(EventAggregator::new(metrics.clone()));
    let informer = Arc::new(EventInformer::with_filter(
        aggregator.clone(),
        config.filter.clone(),
    ));

    let state = ServerState {
        metrics: metrics.clone(),
        informer: Some(informer.clone()),
    };
    let mut endpoint = tokio::spawn(server::serve(config.event_addr, state, token.clone()));

    let events: Api<Event> = match &config.namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    info!(
        namespace = config.namespace_display(),
        filtered = !config.filter.is_empty(),
        started_at = %aggregator.started_at(),
        "Starting Event aggregation"
    );
    let feed = informer.start(events, token.clone());

    let stopped_early = tokio::select! {
        _ = token.cancelled() => None,
        joined = &mut endpoint => Some(joined),
    };
    let joined = match stopped_early {
        Some(joined) => {
            warn!("Event metrics endpoint stopped, shutting down");
            token.cancel();
            joined
        }
        None => endpoint.await,
    };
    let result = joined
        .map_err(|e| ExporterError::Internal(e.to_string()))
        .and_then(|served| served);

    if let Err(e) = feed.await {
        warn!(error = %e, "Event informer task did not stop cleanly");
    }

    info!(series = metrics.series_count(), "Exporter stopped");
    result
}
