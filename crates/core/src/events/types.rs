use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted after the notification list changes, consumed by SSE listeners.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NotificationEvent {
    Welcome,
    Refreshed(RefreshEvent),
    MarkedRead(MarkedReadEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshEvent {
    pub total: usize,
    pub unread_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedReadEvent {
    pub notification_id: String,
    pub unread_count: usize,
    /// Upstream mark-read requests issued for this notification.
    pub requests: usize,
    pub timestamp: DateTime<Utc>,
}
