pub mod cascade;
pub mod engine;
pub mod types;

pub use cascade::ReadOutcome;
pub use engine::{EngineError, NotificationEngine, ReadReconciliation};
pub use types::{ActionBucket, ConsolidatedNotification, Notification};
