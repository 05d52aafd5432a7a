//! Event filtering
//!
//! Allow-lists restricting which Events reach the aggregator. Each list is
//! independent and an empty list lets everything through.

use crate::record::EventRecord;

/// Allow-lists applied to every Event before it is tracked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Event types, e.g. `Normal`, `Warning`
    pub event_types: Vec<String>,
    /// Namespaces of the involved object
    pub involved_object_namespaces: Vec<String>,
    /// API groups of the involved object; the core group is `""`
    pub involved_object_api_groups: Vec<String>,
    /// Controllers that emitted the Event
    pub reporting_controllers: Vec<String>,
}

impl EventFilter {
    /// Filter that accepts every Event
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_types(mut self, types: Vec<String>) -> Self {
        self.event_types = types;
        self
    }

    pub fn with_involved_object_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.involved_object_namespaces = namespaces;
        self
    }

    pub fn with_involved_object_api_groups(mut self, groups: Vec<String>) -> Self {
        self.involved_object_api_groups = groups;
        self
    }

    pub fn with_reporting_controllers(mut self, controllers: Vec<String>) -> Self {
        self.reporting_controllers = controllers;
        self
    }

    /// Whether no restriction is configured
    pub fn is_empty(&self) -> bool {
        self.event_types.is_empty()
            && self.involved_object_namespaces.is_empty()
            && self.involved_object_api_groups.is_empty()
            && self.reporting_controllers.is_empty()
    }

    /// Whether the Event passes every configured allow-list
    pub fn matches(&self, record: &EventRecord) -> bool {
        allowed(&self.event_types, &record.event_type)
            && allowed(
                &self.involved_object_namespaces,
                &record.involved_object.namespace,
            )
            && allowed(
                &self.involved_object_api_groups,
                record.involved_object.api_group(),
            )
            && allowed(&self.reporting_controllers, &record.reporting_controller)
    }
}

fn allowed(list: &[String], value: &str) -> bool {
    list.is_empty() || list.iter().any(|entry| entry == value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::InvolvedObject;

    fn deployment_event() -> EventRecord {
        EventRecord {
            event_type: "Normal".to_string(),
            involved_object: InvolvedObject {
                namespace: "payments".to_string(),
                kind: "Deployment".to_string(),
                api_version: "apps/v1".to_string(),
            },
            reason: "ScalingReplicaSet".to_string(),
            reporting_controller: "deployment-controller".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = EventFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&deployment_event()));
        assert!(filter.matches(&EventRecord::default()));
    }

    #[test]
    fn test_event_type_filter() {
        let filter = EventFilter::new().with_event_types(vec!["Warning".to_string()]);
        assert!(!filter.is_empty());
        assert!(!filter.matches(&deployment_event()));

        let mut warning = deployment_event();
        warning.event_type = "Warning".to_string();
        assert!(filter.matches(&warning));
    }

    #[test]
    fn test_namespace_filter() {
        let filter = EventFilter::new()
            .with_involved_object_namespaces(vec!["payments".to_string(), "shop".to_string()]);
        assert!(filter.matches(&deployment_event()));

        let mut other = deployment_event();
        other.involved_object.namespace = "kube-system".to_string();
        assert!(!filter.matches(&other));
    }

    #[test]
    fn test_core_api_group_filter() {
        let filter = EventFilter::new().with_involved_object_api_groups(vec![String::new()]);
        assert!(!filter.matches(&deployment_event()));

        let mut pod = deployment_event();
        pod.involved_object.api_version = "v1".to_string();
        assert!(filter.matches(&pod));
    }

    #[test]
    fn test_all_lists_must_match() {
        let filter = EventFilter::new()
            .with_event_types(vec!["Normal".to_string()])
            .with_involved_object_api_groups(vec!["apps".to_string()])
            .with_reporting_controllers(vec!["kubelet".to_string()]);
        assert!(!filter.matches(&deployment_event()));

        let filter = filter.with_reporting_controllers(vec!["deployment-controller".to_string()]);
        assert!(filter.matches(&deployment_event()));
    }
}
