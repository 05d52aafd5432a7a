//! Event Informer
//!
//! Pumps a kube-rs watch stream of `core/v1` Events into a
//! [`NotificationSink`]. The watcher only reports the current state of an
//! object, so the informer keeps the last seen record per identity and pairs
//! it with the new one to deliver `on_update(old, new)`. The first sighting of
//! an identity is delivered as `on_add(new)`.
//!
//! Because the pairing is keyed by identity, a repeated delivery of an Event
//! that is already tracked turns into an update with nothing new to count.
//!
//! Relists (`Init` .. `InitDone`) re-deliver every stored Event. Identities
//! that did not reappear were deleted while the watch was down and are
//! dropped from the cache once the relist completes.

use crate::aggregator::NotificationSink;
use crate::filter::EventFilter;
use crate::record::EventRecord;
use crate::telemetry::ExporterMetrics;
use dashmap::DashMap;
use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::Event;
use kube::runtime::{watcher, WatchStreamExt};
use kube::Api;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Watch-backed source of Event add/update notifications
pub struct EventInformer {
    sink: Arc<dyn NotificationSink>,
    filter: EventFilter,
    cache: DashMap<String, EventRecord>,
    relist: Mutex<Option<HashSet<String>>>,
    synced: AtomicBool,
    telemetry: ExporterMetrics,
}

impl EventInformer {
    /// Create an informer delivering every Event to `sink`
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self::with_filter(sink, EventFilter::default())
    }

    /// Create an informer delivering only Events accepted by `filter`
    pub fn with_filter(sink: Arc<dyn NotificationSink>, filter: EventFilter) -> Self {
        Self {
            sink,
            filter,
            cache: DashMap::new(),
            relist: Mutex::new(None),
            synced: AtomicBool::new(false),
            telemetry: ExporterMetrics::new(),
        }
    }

    /// Whether the initial list has been fully delivered
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    /// Number of Event identities currently tracked
    pub fn cached_events(&self) -> usize {
        self.cache.len()
    }

    /// Start watching `api` in the background.
    ///
    /// Returns immediately. The task ends when `token` is cancelled.
    pub fn start(self: &Arc<Self>, api: Api<Event>, token: CancellationToken) -> JoinHandle<()> {
        let stream = watcher(api, watcher::Config::default()).default_backoff();
        let informer = Arc::clone(self);
        tokio::spawn(async move { informer.run(stream, token).await })
    }

    /// Drive the informer from a watch stream until it ends or `token` fires
    pub async fn run<S>(&self, stream: S, token: CancellationToken)
    where
        S: Stream<Item = Result<watcher::Event<Event>, watcher::Error>>,
    {
        let mut stream = std::pin::pin!(stream);
        info!("Starting Event informer");

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Event informer shutting down");
                    break;
                }
                item = stream.next() => match item {
                    Some(Ok(event)) => self.handle(event),
                    Some(Err(e)) => {
                        self.telemetry.watch_errors.increment(1);
                        warn!(error = %e, "Event watch failed, retrying");
                    }
                    None => {
                        warn!("Event watch stream ended");
                        break;
                    }
                },
            }
        }
    }

    /// Apply one watch event to the cache and notify the sink
    pub fn handle(&self, event: watcher::Event<Event>) {
        match event {
            watcher::Event::Apply(obj) | watcher::Event::InitApply(obj) => self.apply(&obj),
            watcher::Event::Delete(obj) => self.forget(&obj),
            watcher::Event::Init => {
                debug!("Event relist started");
                *self.relist.lock() = Some(HashSet::new());
            }
            watcher::Event::InitDone => self.finish_relist(),
        }
        self.telemetry.cached_events.set(self.cache.len() as f64);
    }

    fn apply(&self, event: &Event) {
        let record = EventRecord::from(event);
        let identity = record.identity();

        if let Some(seen) = self.relist.lock().as_mut() {
            seen.insert(identity.clone());
        }

        if !self.filter.matches(&record) {
            self.telemetry.filtered.increment(1);
            return;
        }

        match self.cache.insert(identity, record.clone()) {
            Some(old) => {
                self.telemetry.updates.increment(1);
                self.sink.on_update(&old, &record);
            }
            None => {
                self.telemetry.adds.increment(1);
                self.sink.on_add(&record);
            }
        }
    }

    fn forget(&self, event: &Event) {
        let identity = EventRecord::from(event).identity();
        if self.cache.remove(&identity).is_some() {
            self.telemetry.deletes.increment(1);
        }
    }

    fn finish_relist(&self) {
        if let Some(seen) = self.relist.lock().take() {
            let before = self.cache.len();
            self.cache.retain(|identity, _| seen.contains(identity));
            let pruned = before - self.cache.len();
            if pruned > 0 {
                debug!(pruned, "Dropped Events deleted during relist");
            }
        }

        if !self.synced.swap(true, Ordering::AcqRel) {
            info!(events = self.cache.len(), "Event informer synced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[derive(Default)]
    struct RecordingSink {
        adds: Mutex<Vec<EventRecord>>,
        updates: Mutex<Vec<(EventRecord, EventRecord)>>,
    }

    impl NotificationSink for RecordingSink {
        fn on_add(&self, record: &EventRecord) {
            self.adds.lock().push(record.clone());
        }

        fn on_update(&self, old: &EventRecord, new: &EventRecord) {
            self.updates.lock().push((old.clone(), new.clone()));
        }
    }

    fn event(uid: &str, event_type: &str, count: i32) -> Event {
        Event {
            metadata: ObjectMeta {
                name: Some(format!("ev-{}", uid)),
                namespace: Some("default".to_string()),
                uid: Some(uid.to_string()),
                ..Default::default()
            },
            type_: Some(event_type.to_string()),
            reason: Some("Created".to_string()),
            count: Some(count),
            ..Default::default()
        }
    }

    fn informer() -> (Arc<RecordingSink>, EventInformer) {
        let sink = Arc::new(RecordingSink::default());
        let informer = EventInformer::new(sink.clone());
        (sink, informer)
    }

    #[test]
    fn test_first_sighting_is_add_then_update() {
        let (sink, informer) = informer();
        informer.handle(watcher::Event::Apply(event("a", "Normal", 1)));
        informer.handle(watcher::Event::Apply(event("a", "Normal", 2)));

        assert_eq!(sink.adds.lock().len(), 1);
        let updates = sink.updates.lock();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0.count, 1);
        assert_eq!(updates[0].1.count, 2);
    }

    #[test]
    fn test_duplicate_delivery_becomes_update() {
        let (sink, informer) = informer();
        informer.handle(watcher::Event::Apply(event("a", "Normal", 1)));
        informer.handle(watcher::Event::Apply(event("a", "Normal", 1)));

        assert_eq!(sink.adds.lock().len(), 1);
        assert_eq!(sink.updates.lock().len(), 1);
        assert_eq!(informer.cached_events(), 1);
    }

    #[test]
    fn test_delete_evicts_identity() {
        let (sink, informer) = informer();
        informer.handle(watcher::Event::Apply(event("a", "Normal", 1)));
        informer.handle(watcher::Event::Delete(event("a", "Normal", 1)));
        assert_eq!(informer.cached_events(), 0);

        informer.handle(watcher::Event::Apply(event("a", "Normal", 1)));
        assert_eq!(sink.adds.lock().len(), 2);
        assert!(sink.updates.lock().is_empty());
    }

    #[test]
    fn test_relist_prunes_missing_and_marks_synced() {
        let (sink, informer) = informer();
        assert!(!informer.is_synced());

        informer.handle(watcher::Event::Init);
        informer.handle(watcher::Event::InitApply(event("a", "Normal", 1)));
        informer.handle(watcher::Event::InitApply(event("b", "Normal", 1)));
        informer.handle(watcher::Event::InitDone);
        assert!(informer.is_synced());
        assert_eq!(informer.cached_events(), 2);

        informer.handle(watcher::Event::Init);
        informer.handle(watcher::Event::InitApply(event("a", "Normal", 1)));
        informer.handle(watcher::Event::InitDone);
        assert_eq!(informer.cached_events(), 1);

        assert_eq!(sink.adds.lock().len(), 2);
        assert_eq!(sink.updates.lock().len(), 1);
    }

    #[test]
    fn test_filtered_events_never_reach_sink() {
        let sink = Arc::new(RecordingSink::default());
        let filter = EventFilter::new().with_event_types(vec!["Warning".to_string()]);
        let informer = EventInformer::with_filter(sink.clone(), filter);

        informer.handle(watcher::Event::Apply(event("a", "Normal", 1)));
        informer.handle(watcher::Event::Apply(event("b", "Warning", 1)));

        let adds = sink.adds.lock();
        assert_eq!(adds.len(), 1);
        assert_eq!(adds[0].event_type, "Warning");
        assert_eq!(informer.cached_events(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let (_sink, informer) = informer();
        let token = CancellationToken::new();
        token.cancel();

        informer
            .run(
                futures::stream::pending::<Result<watcher::Event<Event>, watcher::Error>>(),
                token,
            )
            .await;
        assert!(!informer.is_synced());
    }
}
