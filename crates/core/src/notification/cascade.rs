//! Read-state cascade: marking a notification read marks its sources read.

use serde::Serialize;

use super::types::Notification;
use crate::model::EventId;

/// Result of marking one notification read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOutcome {
    /// Events that still need a mark-read request upstream.
    pub pending_requests: Vec<EventId>,
    /// Unread notifications left after the update.
    pub unread_count: usize,
}

/// Number of unread notifications in a list.
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read()).count()
}

/// Optimistically mark `notification` read and return the event ids that
/// need a mark-read request.
///
/// Source events already read are skipped, so repeating the call yields no
/// ids. A passthrough notification yields its own id while unread.
pub fn mark_read(notification: &mut Notification) -> Vec<EventId> {
    match notification {
        Notification::Consolidated(n) => {
            let pending = n
                .original_notifications
                .iter_mut()
                .filter(|event| !event.read)
                .map(|event| {
                    event.read = true;
                    event.id.clone()
                })
                .collect();
            n.read = true;
            pending
        }
        Notification::Passthrough(event) => {
            if event.read {
                Vec::new()
            } else {
                event.read = true;
                vec![event.id.clone()]
            }
        }
    }
}
