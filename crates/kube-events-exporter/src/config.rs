//! Exporter configuration

use crate::error::{ExporterError, Result};
use crate::filter::EventFilter;
use std::net::SocketAddr;

/// Default listen address of the event metrics endpoint
pub const DEFAULT_EVENT_ADDR: &str = "0.0.0.0:8080";

/// Default listen address of the exporter self-metrics endpoint
pub const DEFAULT_EXPORTER_ADDR: &str = "0.0.0.0:8081";

/// Runtime configuration of the exporter
#[derive(Debug, Clone)]
pub struct ExporterConfig {
    /// Address serving `kube_events_total`
    pub event_addr: SocketAddr,
    /// Address serving the exporter's own metrics
    pub exporter_addr: SocketAddr,
    /// Namespace to watch Events in, `None` for cluster-wide
    pub namespace: Option<String>,
    /// Which Events are counted
    pub filter: EventFilter,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            event_addr: ([0, 0, 0, 0], 8080).into(),
            exporter_addr: ([0, 0, 0, 0], 8081).into(),
            namespace: None,
            filter: EventFilter::default(),
        }
    }
}

impl ExporterConfig {
    /// Reject configurations the exporter cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.event_addr == self.exporter_addr {
            return Err(ExporterError::InvalidConfig(format!(
                "event and exporter metrics cannot share the listen address {}",
                self.event_addr
            )));
        }

        if matches!(&self.namespace, Some(ns) if ns.is_empty()) {
            return Err(ExporterError::InvalidConfig(
                "namespace must not be empty; omit it to watch all namespaces".to_string(),
            ));
        }

        Ok(())
    }

    /// Namespace label used in logs
    pub fn namespace_display(&self) -> &str {
        self.namespace.as_deref().unwrap_or("all")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExporterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.event_addr.to_string(), DEFAULT_EVENT_ADDR);
        assert_eq!(config.exporter_addr.to_string(), DEFAULT_EXPORTER_ADDR);
        assert_eq!(config.namespace_display(), "all");
    }

    #[test]
    fn test_shared_address_rejected() {
        let config = ExporterConfig {
            exporter_addr: ([0, 0, 0, 0], 8080).into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ExporterError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let config = ExporterConfig {
            namespace: Some(String::new()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
