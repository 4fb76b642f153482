//! Raw events in, notification list out.
//!
//! validate -> sort newest first -> classify -> group per bucket ->
//! consolidate (updated, deleted, added) -> append passthrough events.

pub mod backfill;
pub mod classify;
pub mod consolidate;
pub mod group;

use chrono::Duration;

use crate::model::{validate_event, Event, IdStrategy, RawEvent};
use crate::notification::types::{ActionBucket, Notification};

pub use backfill::{backfill, backfill_timestamps};
pub use classify::{bucket_of, classify, is_glossary_event, partition_buckets};
pub use consolidate::consolidate;
pub use group::{group_by_time, EventGroup};

/// Tunables of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum distance from a group's anchor.
    pub window: Duration,
    pub id_strategy: IdStrategy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            window: group::default_window(),
            id_strategy: IdStrategy::default(),
        }
    }
}

/// Drop events that cannot be placed in time, logging each one.
pub fn validate_all(raw: Vec<RawEvent>) -> Vec<Event> {
    raw.into_iter()
        .filter_map(|event| match validate_event(event) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("dropping malformed event: {e}");
                None
            }
        })
        .collect()
}

/// Run the full aggregation over one feed snapshot.
pub fn run(raw: Vec<RawEvent>, options: &PipelineOptions) -> Vec<Notification> {
    let received = raw.len();
    let mut events = validate_all(raw);
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let classification = classify(events);
    let mut buckets = partition_buckets(classification.glossary);
    if !buckets.unmatched.is_empty() {
        tracing::debug!(
            count = buckets.unmatched.len(),
            "glossary events without an action bucket were dropped"
        );
    }

    let mut notifications = Vec::new();
    for bucket in ActionBucket::EMIT_ORDER {
        let groups = group_by_time(buckets.take(bucket), options.window);
        notifications.extend(
            consolidate(bucket, groups, options.id_strategy)
                .into_iter()
                .map(Notification::Consolidated),
        );
    }
    let consolidated = notifications.len();
    notifications.extend(
        classification
            .passthrough
            .into_iter()
            .map(Notification::Passthrough),
    );

    tracing::debug!(
        received,
        consolidated,
        passthrough = notifications.len() - consolidated,
        "notification pipeline run complete"
    );
    notifications
}
