//! Temporal clustering of events within one action bucket.
//!
//! Clustering is leader based: every member of a group is compared with the
//! group's anchor (its newest event), never with its neighbour. Events at
//! t=0, t=25 and t=50 minutes therefore form two groups, `[50, 25]` and `[0]`.

use chrono::{DateTime, Duration, Utc};

use crate::model::Event;

/// Default clustering window in minutes.
pub const DEFAULT_WINDOW_MINUTES: i64 = 30;

pub fn default_window() -> Duration {
    Duration::minutes(DEFAULT_WINDOW_MINUTES)
}

/// Whether two instants lie within `window` of each other, bounds inclusive.
pub fn within_window(a: DateTime<Utc>, b: DateTime<Utc>, window: Duration) -> bool {
    let gap = if a >= b { a - b } else { b - a };
    gap <= window
}

/// Non-empty run of events anchored on its first (newest) member.
#[derive(Debug, Clone, PartialEq)]
pub struct EventGroup {
    events: Vec<Event>,
}

impl EventGroup {
    fn start(anchor: Event) -> Self {
        Self {
            events: vec![anchor],
        }
    }

    /// The newest event; the reference point for window membership.
    pub fn anchor(&self) -> &Event {
        &self.events[0]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn admits(&self, event: &Event, window: Duration) -> bool {
        within_window(event.created_at, self.anchor().created_at, window)
    }
}

/// Partition events into time-proximity groups, newest group first.
///
/// Events are sorted newest first with a stable sort, so equal timestamps keep
/// their input order and always join the open group.
pub fn group_by_time(mut events: Vec<Event>, window: Duration) -> Vec<EventGroup> {
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut groups = Vec::new();
    let mut events = events.into_iter();
    let Some(first) = events.next() else {
        return groups;
    };

    let mut current = EventGroup::start(first);
    for event in events {
        if current.admits(&event, window) {
            current.events.push(event);
        } else {
            groups.push(std::mem::replace(&mut current, EventGroup::start(event)));
        }
    }
    groups.push(current);
    groups
}
