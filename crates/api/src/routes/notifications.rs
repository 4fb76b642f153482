use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use glossary_notify_core::events::types::NotificationEvent;
use glossary_notify_core::model::Language;
use glossary_notify_core::{ActionBucket, Notification, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::error::ApiResult;
use crate::state::AppState;

const FALLBACK_HEADING: &str = "KEYWORD UPDATE DETAILS";
const FALLBACK_TIME_LABEL: &str = "Update Time";

/// Notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/notifications", get(list))
        .route("/v1/notifications/unread-count", get(unread_count))
        .route("/v1/notifications/listen", get(listen))
        .route("/v1/notifications/refresh", post(refresh))
        .route("/v1/notifications/{id}", get(details))
        .route("/v1/notifications/{id}/read", post(mark_read))
}

async fn list(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.service().snapshot().await)
}

async fn unread_count(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "unreadCount": state.service().unread_count().await }))
}

async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let unread_count = state.service().mark_read(&id).await?;
    Ok(Json(json!({ "unreadCount": unread_count })))
}

async fn refresh(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let total = state.service().refresh().await?;
    Ok(Json(json!({ "total": total })))
}

/// One line of the detail table.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailRow {
    no: usize,
    japanese: String,
    english: String,
    vietnamese: String,
    chinese_traditional: String,
    chinese_simplified: String,
    action: ActionBucket,
    time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailView {
    heading: &'static str,
    time_label: &'static str,
    rows: Vec<DetailRow>,
    notification: Notification,
}

impl DetailView {
    fn new(notification: Notification) -> Self {
        let bucket = notification.action_bucket();
        let row_bucket = bucket.unwrap_or(ActionBucket::Updated);
        let fallback_time = notification.created_at();

        let rows = notification
            .change_items()
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let value = |language| item.values.get(language).unwrap_or_default().to_string();
                DetailRow {
                    no: i + 1,
                    japanese: value(Language::Japanese),
                    english: value(Language::English),
                    vietnamese: value(Language::Vietnamese),
                    chinese_traditional: value(Language::ChineseTraditional),
                    chinese_simplified: value(Language::ChineseSimplified),
                    action: item.effective_action(row_bucket),
                    time: item.display_time(fallback_time),
                }
            })
            .collect();

        Self {
            heading: bucket.map_or(FALLBACK_HEADING, ActionBucket::heading),
            time_label: bucket.map_or(FALLBACK_TIME_LABEL, ActionBucket::time_label),
            rows,
            notification,
        }
    }
}

/// Notification with backfilled change times, laid out for the detail view.
async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DetailView>> {
    let notification = state.service().details(&id).await?;
    Ok(Json(DetailView::new(notification)))
}

/// Server-Sent Events stream of notification changes, starting with a welcome.
async fn listen(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.service().bus().subscribe();

    let updates = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(event) => Some(event),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE listener lagged behind the notification bus");
            None
        }
    });

    let stream = tokio_stream::once(NotificationEvent::Welcome)
        .chain(updates)
        .filter_map(|event| match SseEvent::default().json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                tracing::warn!("Failed to encode notification event: {e}");
                None
            }
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use glossary_notify_core::events::bus::EventBus;
    use glossary_notify_core::model::IdStrategy;
    use glossary_notify_core::{
        EventFeed, EventId, FeedError, NotificationEngine, NotificationService, RawEvent,
        ReadReconciliation,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::routes::build_router;
    use crate::state::AppState;

    struct StubFeed {
        events: Vec<RawEvent>,
        reachable: AtomicBool,
        marked: Mutex<Vec<EventId>>,
    }

    impl StubFeed {
        fn check(&self) -> Result<(), FeedError> {
            if self.reachable.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(FeedError::Transport("connection refused".into()))
            }
        }
    }

    #[async_trait]
    impl EventFeed for StubFeed {
        async fn fetch_events(&self) -> Result<Vec<RawEvent>, FeedError> {
            self.check()?;
            Ok(self.events.clone())
        }

        async fn mark_event_read(&self, id: &EventId) -> Result<(), FeedError> {
            self.check()?;
            self.marked.lock().unwrap().push(id.clone());
            Ok(())
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            feed_base_url: "http://backend.invalid".into(),
            feed_token: None,
            poll_interval: Duration::from_secs(30),
            group_window_minutes: 30,
            read_reconciliation: ReadReconciliation::ServerWins,
            id_strategy: IdStrategy::Stable,
            event_bus_capacity: 16,
            log_level: "info".into(),
        }
    }

    async fn app() -> (axum::Router, Arc<NotificationService>, Arc<StubFeed>) {
        let events = serde_json::from_value(json!([
            {"id": 1, "title": "Keyword Deleted", "created_at": "2024-05-01T09:00:00Z",
             "keyword_details": [{"japanese": "猫", "english": "cat", "action": "deleted"}]},
            {"id": 2, "title": "Keyword Deleted", "created_at": "2024-05-01T09:20:00Z",
             "keyword_details": [{"japanese": "犬", "english": "dog"}]},
            {"id": 3, "title": "File uploaded", "created_at": "2024-05-01T08:00:00Z"}
        ]))
        .unwrap();
        let feed = Arc::new(StubFeed {
            events,
            reachable: AtomicBool::new(true),
            marked: Mutex::new(Vec::new()),
        });
        let service = Arc::new(NotificationService::new(
            feed.clone(),
            NotificationEngine::default(),
            EventBus::new(16),
        ));
        service.refresh().await.unwrap();

        let state = AppState::new(Arc::clone(&service), config());
        (build_router(state), service, feed)
    }

    async fn send(app: axum::Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn list_and_unread_count() {
        let (app, _, _) = app().await;
        let (status, body) = send(app.clone(), "GET", "/v1/notifications").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unreadCount"], 2);
        assert_eq!(body["notifications"][0]["kind"], "consolidated");
        assert_eq!(body["notifications"][0]["id"], "consolidated-deleted-2");
        assert_eq!(body["notifications"][1]["kind"], "passthrough");

        let (_, body) = send(app, "GET", "/v1/notifications/unread-count").await;
        assert_eq!(body, json!({"unreadCount": 2}));
    }

    #[tokio::test]
    async fn details_fill_rows() {
        let (app, _, _) = app().await;
        let (status, body) = send(app, "GET", "/v1/notifications/consolidated-deleted-2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["heading"], "KEYWORDS DELETED");
        assert_eq!(body["timeLabel"], "Deleted Time");
        assert_eq!(body["rows"][0]["english"], "dog");
        assert_eq!(body["rows"][0]["action"], "deleted");
        assert_eq!(body["rows"][0]["time"], "2024-05-01T09:20:00Z");
        assert_eq!(body["rows"][1]["no"], 2);
        assert_eq!(body["rows"][1]["time"], "2024-05-01T09:00:00Z");
    }

    #[tokio::test]
    async fn mark_read_decrements_once() {
        let (app, _, feed) = app().await;
        let (status, body) =
            send(app.clone(), "POST", "/v1/notifications/consolidated-deleted-2/read").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unreadCount"], 1);

        let (_, body) = send(app, "POST", "/v1/notifications/consolidated-deleted-2/read").await;
        assert_eq!(body["unreadCount"], 1);
        assert_eq!(feed.marked.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_notification_is_404() {
        let (app, _, _) = app().await;
        let (status, body) = send(app, "POST", "/v1/notifications/nope/read").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["type"], "notFound");
    }

    #[tokio::test]
    async fn upstream_failure_keeps_local_read() {
        let (app, service, feed) = app().await;
        feed.reachable.store(false, Ordering::SeqCst);

        let (status, body) = send(app.clone(), "POST", "/v1/notifications/3/read").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["statusCode"], 502);
        assert_eq!(service.unread_count().await, 1);

        let (status, _) = send(app, "POST", "/v1/notifications/refresh").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(service.snapshot().await.notifications.len(), 2);
    }
}
