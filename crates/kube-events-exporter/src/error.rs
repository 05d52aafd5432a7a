//! Error types for the Kubernetes Events exporter

use thiserror::Error;

/// Errors that can occur while running the exporter
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Prometheus registry error
    #[error("Metrics registry error: {0}")]
    MetricsError(#[from] prometheus::Error),

    /// Listener or socket error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Self-telemetry exporter could not be installed
    #[error("Telemetry error: {0}")]
    TelemetryError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for exporter operations
pub type Result<T> = std::result::Result<T, ExporterError>;
