//! Notification aggregation for the shared keyword glossary.
//!
//! Turns the flat list of change events served by the backend into a compact
//! list of consolidated notifications, and cascades read state back to the
//! original events.

pub mod events;
pub mod feed;
pub mod model;
pub mod notification;
pub mod pipeline;
pub mod scheduler;
pub mod service;

pub use feed::{EventFeed, FeedError};
pub use model::{ChangeItem, Event, EventId, RawEvent};
pub use notification::{ActionBucket, Notification, NotificationEngine, ReadReconciliation};
pub use service::{NotificationService, ServiceError, Snapshot};
