//! HTTP server exposing `kube_events_total`
//!
//! - `GET /metrics` - Prometheus text exposition of the event registry
//! - `GET /healthz` - liveness, always OK while the process serves requests
//! - `GET /readyz` - readiness, OK once the informer delivered its initial list

use crate::collector::SharedEventMetrics;
use crate::error::Result;
use crate::informer::EventInformer;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub metrics: SharedEventMetrics,
    pub informer: Option<Arc<EventInformer>>,
}

/// Build the router for the event metrics endpoint
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .with_state(state)
}

/// Serve the event metrics endpoint until `token` is cancelled
pub async fn serve(addr: SocketAddr, state: ServerState, token: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Event metrics server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;
    Ok(())
}

async fn metrics_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode event metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

async fn readiness_handler(State(state): State<ServerState>) -> StatusCode {
    match &state.informer {
        Some(informer) if informer.is_synced() => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::EventAggregator;
    use crate::collector::{EventLabels, EventMetrics};
    use axum::body::Body;
    use axum::http::Request;
    use kube::runtime::watcher;
    use tower::ServiceExt;

    fn state() -> ServerState {
        let metrics = Arc::new(EventMetrics::new().unwrap());
        let aggregator = Arc::new(EventAggregator::new(metrics.clone()));
        ServerState {
            metrics,
            informer: Some(Arc::new(EventInformer::new(aggregator))),
        }
    }

    async fn get_path(app: Router, path: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_endpoint_empty_before_feed() {
        let (status, body) = get_path(router(state()), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("kube_events_total{"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_exports_counter() {
        let state = state();
        state
            .metrics
            .apply_increment(&EventLabels::new("Warning", "shop", "Pod", "BackOff"), 2.0);

        let (status, body) = get_path(router(state), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("kube_events_total{"));
        assert!(body.contains("reason=\"BackOff\""));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, _) = get_path(router(state()), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_follows_informer_sync() {
        let state = state();
        let (status, _) = get_path(router(state.clone()), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let informer = state.informer.clone().unwrap();
        informer.handle(watcher::Event::Init);
        informer.handle(watcher::Event::InitDone);

        let (status, _) = get_path(router(state), "/readyz").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_not_ready_without_informer() {
        let state = ServerState {
            metrics: Arc::new(EventMetrics::new().unwrap()),
            informer: None,
        };
        let (status, _) = get_path(router(state), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
