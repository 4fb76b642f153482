// HTTP client for the portal backend's notification endpoints.

use async_trait::async_trait;
use glossary_notify_core::{EventFeed, EventId, FeedError, RawEvent};
use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

const NOTIFICATIONS_PATH: &str = "/api/notifications/";

pub struct HttpEventFeed {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl HttpEventFeed {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check_status(response: Response) -> Result<Response, FeedError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(FeedError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Decode feed rows one by one, dropping rows that do not have the shape of an
/// event at all.
fn decode_events(rows: Vec<Value>) -> Vec<RawEvent> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value(row) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(index, "Dropping undecodable notification row: {e}");
                None
            }
        })
        .collect()
}

fn transport(err: reqwest::Error) -> FeedError {
    FeedError::Transport(err.to_string())
}

#[async_trait]
impl EventFeed for HttpEventFeed {
    async fn fetch_events(&self) -> Result<Vec<RawEvent>, FeedError> {
        let response = self
            .request(Method::GET, NOTIFICATIONS_PATH)
            .send()
            .await
            .map_err(transport)?;
        let response = Self::check_status(response).await?;
        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))?;
        Ok(decode_events(rows))
    }

    async fn mark_event_read(&self, id: &EventId) -> Result<(), FeedError> {
        let path = format!("{NOTIFICATIONS_PATH}{id}/read/");
        let response = self
            .request(Method::POST, &path)
            .send()
            .await
            .map_err(transport)?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bad_rows_are_dropped_individually() {
        let rows = vec![
            json!({"id": 1, "title": "Keyword Updated", "created_at": "2024-05-01T09:00:00Z"}),
            json!({"id": 2, "title": "Keyword Updated", "created_at": "2024-05-01 09:00:00"}),
            json!({"id": 3, "read": "maybe"}),
            json!("not an object"),
        ];
        let events = decode_events(rows);
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(events[1].created_at.as_deref(), Some("2024-05-01 09:00:00"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let feed = HttpEventFeed::new("http://backend.local/", None);
        assert_eq!(feed.base_url, "http://backend.local");
    }
}
