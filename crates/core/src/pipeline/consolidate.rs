//! Folding of event groups into consolidated notifications.

use super::group::EventGroup;
use crate::model::IdStrategy;
use crate::notification::types::{ActionBucket, ConsolidatedNotification};

/// Fold one group into a consolidated notification.
pub fn consolidate_group(
    bucket: ActionBucket,
    group: EventGroup,
    ids: IdStrategy,
) -> ConsolidatedNotification {
    let anchor = group.anchor();
    let id = ids.consolidated_id(bucket, &anchor.id);
    let created_at = anchor.created_at;

    let events = group.into_events();
    let keyword_details: Vec<_> = events
        .iter()
        .flat_map(|event| event.keyword_details.iter().cloned())
        .collect();
    let read = events.iter().all(|event| event.read);

    ConsolidatedNotification {
        id,
        title: bucket.title().to_string(),
        message: bucket.message(keyword_details.len()),
        created_at,
        read,
        action_type: bucket,
        keyword_details,
        original_notifications: events,
    }
}

/// Fold every group of one bucket, keeping group order.
pub fn consolidate(
    bucket: ActionBucket,
    groups: Vec<EventGroup>,
    ids: IdStrategy,
) -> Vec<ConsolidatedNotification> {
    groups
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|group| consolidate_group(bucket, group, ids))
        .collect()
}
