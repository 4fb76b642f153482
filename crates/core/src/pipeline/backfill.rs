//! Backfill of missing per-item change times for the detail view.

use crate::notification::types::{ConsolidatedNotification, Notification};

/// Copy of `notification` where every change item lacking a timestamp takes
/// the `created_at` of the first source event touching the same
/// (japanese, english) entry.
///
/// Items with no matching source keep no timestamp; the detail view then
/// falls back to the notification's own time.
pub fn backfill_timestamps(notification: &ConsolidatedNotification) -> ConsolidatedNotification {
    let mut filled = notification.clone();
    let bucket = notification.action_type;

    for item in filled
        .keyword_details
        .iter_mut()
        .filter(|item| item.timestamp().is_none())
    {
        let source = notification
            .original_notifications
            .iter()
            .find(|event| event.touches(&item.values));
        if let Some(source) = source {
            let action = item.effective_action(bucket);
            item.set_timestamp(action, source.created_at);
        }
    }
    filled
}

/// Backfilled copy of any notification. Passthrough notifications have no
/// source events and come back unchanged.
pub fn backfill(notification: &Notification) -> Notification {
    match notification {
        Notification::Consolidated(n) if !n.keyword_details.is_empty() => {
            Notification::Consolidated(backfill_timestamps(n))
        }
        other => other.clone(),
    }
}
