//! Collaborator that supplies raw events and records reads upstream.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{EventId, RawEvent};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("feed unreachable: {0}")]
    Transport(String),
    #[error("feed returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("feed payload could not be decoded: {0}")]
    Decode(String),
}

/// Source of change events for the authenticated user.
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Full current set of events. No pagination is assumed.
    async fn fetch_events(&self) -> Result<Vec<RawEvent>, FeedError>;

    /// Record one event as read. Marking a read event again succeeds.
    async fn mark_event_read(&self, id: &EventId) -> Result<(), FeedError>;
}
