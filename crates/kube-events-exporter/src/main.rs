//! Kubernetes Events Exporter
//!
//! Counts Kubernetes Events by type, involved object and reason and serves the
//! result to Prometheus.

use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use kube_events_exporter::prelude::*;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

/// Kubernetes Events Exporter
#[derive(Parser, Debug)]
#[command(name = "kube-events-exporter")]
#[command(about = "Prometheus exporter counting Kubernetes Events")]
#[command(version)]
struct Args {
    /// Address serving kube_events_total
    #[arg(long, env = "EVENT_ADDR", default_value = "0.0.0.0:8080")]
    event_addr: SocketAddr,

    /// Address serving the exporter's own metrics
    #[arg(long, env = "EXPORTER_ADDR", default_value = "0.0.0.0:8081")]
    exporter_addr: SocketAddr,

    /// Namespace to watch (empty for cluster-wide)
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "")]
    namespace: String,

    /// Only count Events of these types
    #[arg(long, env = "EVENT_TYPES", value_delimiter = ',')]
    event_types: Vec<String>,

    /// Only count Events about objects in these namespaces
    #[arg(long, env = "INVOLVED_OBJECT_NAMESPACES", value_delimiter = ',')]
    involved_object_namespaces: Vec<String>,

    /// Only count Events about objects in these API groups ("" is core)
    #[arg(long, env = "INVOLVED_OBJECT_API_GROUPS", value_delimiter = ',')]
    involved_object_api_groups: Vec<String>,

    /// Only count Events emitted by these controllers
    #[arg(long, env = "REPORTING_CONTROLLERS", value_delimiter = ',')]
    reporting_controllers: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: Level,

    /// Enable JSON log format
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    log_json: bool,
}

impl Args {
    fn into_config(self) -> ExporterConfig {
        let filter = EventFilter::new()
            .with_event_types(self.event_types)
            .with_involved_object_namespaces(self.involved_object_namespaces)
            .with_involved_object_api_groups(self.involved_object_api_groups)
            .with_reporting_controllers(self.reporting_controllers);

        ExporterConfig {
            event_addr: self.event_addr,
            exporter_addr: self.exporter_addr,
            namespace: if self.namespace.is_empty() {
                None
            } else {
                Some(self.namespace)
            },
            filter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = args.into_config();
    config.validate().context("Invalid exporter configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        namespace = config.namespace_display(),
        "Starting Kubernetes Events Exporter"
    );

    install_exporter_metrics(config.exporter_addr)
        .context("Failed to start exporter metrics server")?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let token = CancellationToken::new();
    let signal_token = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        signal_token.cancel();
    });

    run_exporter(client, config, token)
        .await
        .context("Exporter failed")?;

    Ok(())
}

/// Initialize logging subsystem
fn init_logging(args: &Args) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(false);

    if args.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
