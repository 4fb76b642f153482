use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::{self, JoinSet};

use crate::events::bus::EventBus;
use crate::events::types::{MarkedReadEvent, NotificationEvent, RefreshEvent};
use crate::feed::{EventFeed, FeedError};
use crate::model::{EventId, RawEvent};
use crate::notification::{EngineError, Notification, NotificationEngine};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("{} of {requested} mark-read requests failed", .failed.len())]
    MarkRead {
        requested: usize,
        failed: Vec<EventId>,
        unread_count: usize,
    },
}

/// Current notification list together with its unread count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

/// Glue between the event feed, the engine state and the bus.
///
/// The engine lock is never held across a feed call.
pub struct NotificationService {
    engine: Mutex<NotificationEngine>,
    feed: Arc<dyn EventFeed>,
    bus: EventBus,
}

impl NotificationService {
    pub fn new(feed: Arc<dyn EventFeed>, engine: NotificationEngine, bus: EventBus) -> Self {
        Self {
            engine: Mutex::new(engine),
            feed,
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Fetch a feed snapshot without touching engine state.
    pub async fn fetch(&self) -> Result<Vec<RawEvent>, FeedError> {
        self.feed.fetch_events().await
    }

    /// Replace the engine output with the pipeline result for `raw`.
    pub async fn apply(&self, raw: Vec<RawEvent>) -> usize {
        let (total, unread_count) = {
            let mut engine = self.engine.lock().await;
            let total = engine.ingest(raw);
            (total, engine.unread_count())
        };
        self.bus.publish(NotificationEvent::Refreshed(RefreshEvent {
            total,
            unread_count,
            timestamp: Utc::now(),
        }));
        total
    }

    /// Fetch and apply. On failure the previous output stays in place.
    pub async fn refresh(&self) -> Result<usize, FeedError> {
        match self.fetch().await {
            Ok(raw) => Ok(self.apply(raw).await),
            Err(e) => {
                tracing::error!("Failed to fetch notifications: {e}");
                Err(e)
            }
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        let engine = self.engine.lock().await;
        Snapshot {
            notifications: engine.notifications().to_vec(),
            unread_count: engine.unread_count(),
        }
    }

    pub async fn unread_count(&self) -> usize {
        self.engine.lock().await.unread_count()
    }

    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.engine.lock().await.last_refreshed()
    }

    pub async fn details(&self, id: &str) -> Result<Notification, ServiceError> {
        Ok(self.engine.lock().await.details(id)?)
    }

    /// Mark a notification read.
    ///
    /// Local state is updated first; the upstream requests then run
    /// concurrently. Failed requests are logged and reported, the local read
    /// state is kept. Returns the new unread count.
    pub async fn mark_read(&self, id: &str) -> Result<usize, ServiceError> {
        let outcome = self.engine.lock().await.mark_read(id)?;
        let requested = outcome.pending_requests.len();

        self.bus.publish(NotificationEvent::MarkedRead(MarkedReadEvent {
            notification_id: id.to_string(),
            unread_count: outcome.unread_count,
            requests: requested,
            timestamp: Utc::now(),
        }));

        let mut requests = JoinSet::new();
        let mut in_flight: HashMap<task::Id, EventId> = HashMap::new();
        for event_id in outcome.pending_requests {
            let feed = Arc::clone(&self.feed);
            let request_id = event_id.clone();
            let handle = requests.spawn(async move { feed.mark_event_read(&request_id).await });
            in_flight.insert(handle.id(), event_id);
        }

        let mut failed = Vec::new();
        while let Some(joined) = requests.join_next_with_id().await {
            let (task_id, error) = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((task_id, Err(e))) => (task_id, e.to_string()),
                Err(e) => (e.id(), format!("request task aborted: {e}")),
            };
            if let Some(event_id) = in_flight.remove(&task_id) {
                tracing::error!(event_id = %event_id, "Failed to mark event as read: {error}");
                failed.push(event_id);
            }
        }

        if failed.is_empty() {
            return Ok(outcome.unread_count);
        }
        self.engine.lock().await.forget_pending(&failed);
        Err(ServiceError::MarkRead {
            requested,
            failed,
            unread_count: outcome.unread_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::notification::ReadReconciliation;
    use crate::pipeline::PipelineOptions;

    #[derive(Default)]
    struct StubFeed {
        events: StdMutex<Vec<RawEvent>>,
        fail_fetch: StdMutex<bool>,
        fail_ids: Vec<EventId>,
        panic_ids: Vec<EventId>,
        marked: StdMutex<Vec<EventId>>,
    }

    #[async_trait]
    impl EventFeed for StubFeed {
        async fn fetch_events(&self) -> Result<Vec<RawEvent>, FeedError> {
            if *self.fail_fetch.lock().unwrap() {
                return Err(FeedError::Transport("connection refused".into()));
            }
            Ok(self.events.lock().unwrap().clone())
        }

        async fn mark_event_read(&self, id: &EventId) -> Result<(), FeedError> {
            if self.panic_ids.contains(id) {
                panic!("client crashed on {id}");
            }
            if self.fail_ids.contains(id) {
                return Err(FeedError::Status {
                    status: 500,
                    message: "boom".into(),
                });
            }
            self.marked.lock().unwrap().push(id.clone());
            Ok(())
        }
    }

    fn events() -> Vec<RawEvent> {
        serde_json::from_value(json!([
            {"id": 1, "title": "Keyword Deleted", "created_at": "2024-05-01T09:00:00Z",
             "keyword_details": [{"english": "cat", "action": "deleted"}]},
            {"id": 2, "title": "Keyword Deleted", "created_at": "2024-05-01T09:05:00Z",
             "keyword_details": [{"english": "dog", "action": "deleted"}]},
            {"id": 3, "title": "Account approved", "created_at": "2024-05-01T09:06:00Z"}
        ]))
        .unwrap()
    }

    fn service(feed: Arc<StubFeed>) -> NotificationService {
        NotificationService::new(feed, NotificationEngine::default(), EventBus::new(16))
    }

    #[tokio::test]
    async fn refresh_then_mark_read() {
        let feed = Arc::new(StubFeed {
            events: StdMutex::new(events()),
            ..Default::default()
        });
        let svc = service(Arc::clone(&feed));
        let mut rx = svc.bus().subscribe();

        assert_eq!(svc.refresh().await.unwrap(), 2);
        assert!(matches!(rx.recv().await.unwrap(), NotificationEvent::Refreshed(_)));
        assert_eq!(svc.unread_count().await, 2);

        assert_eq!(svc.mark_read("consolidated-deleted-2").await.unwrap(), 1);
        let mut marked = feed.marked.lock().unwrap().clone();
        marked.sort();
        assert_eq!(marked, vec![EventId::from(1), EventId::from(2)]);

        // Repeating issues nothing new.
        assert_eq!(svc.mark_read("consolidated-deleted-2").await.unwrap(), 1);
        assert_eq!(feed.marked.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_output() {
        let feed = Arc::new(StubFeed {
            events: StdMutex::new(events()),
            ..Default::default()
        });
        let svc = service(Arc::clone(&feed));
        svc.refresh().await.unwrap();

        *feed.fail_fetch.lock().unwrap() = true;
        assert!(svc.refresh().await.is_err());
        assert_eq!(svc.snapshot().await.notifications.len(), 2);
    }

    #[tokio::test]
    async fn failed_mark_read_keeps_optimistic_state() {
        let feed = Arc::new(StubFeed {
            events: StdMutex::new(events()),
            fail_ids: vec![EventId::from(1)],
            ..Default::default()
        });
        let svc = service(Arc::clone(&feed));
        svc.refresh().await.unwrap();

        let err = svc.mark_read("consolidated-deleted-2").await.unwrap_err();
        match err {
            ServiceError::MarkRead {
                requested,
                failed,
                unread_count,
            } => {
                assert_eq!(requested, 2);
                assert_eq!(failed, vec![EventId::from(1)]);
                assert_eq!(unread_count, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(svc.unread_count().await, 1);
    }

    #[tokio::test]
    async fn crashed_request_counts_as_failed() {
        let feed = Arc::new(StubFeed {
            events: StdMutex::new(events()),
            panic_ids: vec![EventId::from(2)],
            ..Default::default()
        });
        let engine =
            NotificationEngine::new(PipelineOptions::default(), ReadReconciliation::MergePending);
        let svc = NotificationService::new(feed.clone(), engine, EventBus::new(16));
        svc.refresh().await.unwrap();

        match svc.mark_read("consolidated-deleted-2").await.unwrap_err() {
            ServiceError::MarkRead {
                requested, failed, ..
            } => {
                assert_eq!(requested, 2);
                assert_eq!(failed, vec![EventId::from(2)]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*feed.marked.lock().unwrap(), vec![EventId::from(1)]);
        // Only the confirmed request stays pending.
        assert_eq!(svc.engine.lock().await.pending_reads(), 1);
    }

    #[tokio::test]
    async fn unknown_notification() {
        let svc = service(Arc::new(StubFeed::default()));
        assert!(matches!(
            svc.mark_read("missing").await,
            Err(ServiceError::Engine(EngineError::NotFound(_)))
        ));
        assert!(svc.details("missing").await.is_err());
    }
}
