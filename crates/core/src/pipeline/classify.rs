//! Event classification: glossary-related or passthrough, then action bucket.

use crate::model::Event;
use crate::notification::types::ActionBucket;

/// Event `type` the backend uses for glossary changes.
pub const KEYWORD_EVENT_TYPE: &str = "keyword_update";

/// Events split by relevance to the shared glossary.
#[derive(Debug, Default)]
pub struct Classification {
    pub glossary: Vec<Event>,
    pub passthrough: Vec<Event>,
}

/// Glossary events partitioned into action buckets.
#[derive(Debug, Default)]
pub struct Buckets {
    pub updated: Vec<Event>,
    pub deleted: Vec<Event>,
    pub added: Vec<Event>,
    /// Glossary events that matched no bucket. They are dropped from the output.
    pub unmatched: Vec<Event>,
}

impl Buckets {
    pub fn get(&self, bucket: ActionBucket) -> &[Event] {
        match bucket {
            ActionBucket::Updated => &self.updated,
            ActionBucket::Deleted => &self.deleted,
            ActionBucket::Added => &self.added,
        }
    }

    pub fn take(&mut self, bucket: ActionBucket) -> Vec<Event> {
        match bucket {
            ActionBucket::Updated => std::mem::take(&mut self.updated),
            ActionBucket::Deleted => std::mem::take(&mut self.deleted),
            ActionBucket::Added => std::mem::take(&mut self.added),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Whether an event concerns the shared glossary.
///
/// `type` is compared exactly; title and message are matched ignoring case.
pub fn is_glossary_event(event: &Event) -> bool {
    event.kind.as_deref() == Some(KEYWORD_EVENT_TYPE)
        || contains_ignore_case(event.title(), "keyword")
        || contains_ignore_case(event.message(), "keyword")
        || contains_ignore_case(event.message(), "library")
}

/// Action bucket of a glossary event. First match wins: deleted, updated, added.
pub fn bucket_of(event: &Event) -> Option<ActionBucket> {
    let title = event.title();
    let items = &event.keyword_details;

    if title == "Keyword Deleted" || items.iter().any(|k| k.has_action(ActionBucket::Deleted)) {
        return Some(ActionBucket::Deleted);
    }
    if title == "Keyword Updated" || items.iter().any(|k| k.has_action(ActionBucket::Updated)) {
        return Some(ActionBucket::Updated);
    }
    if title.starts_with("New Keyword")
        || items
            .iter()
            .any(|k| k.action.is_none() || k.has_action(ActionBucket::Added))
    {
        return Some(ActionBucket::Added);
    }
    None
}

/// Split events into glossary-related and passthrough, preserving order.
pub fn classify(events: Vec<Event>) -> Classification {
    let (glossary, passthrough): (Vec<Event>, Vec<Event>) =
        events.into_iter().partition(is_glossary_event);
    Classification {
        glossary,
        passthrough,
    }
}

/// Assign each glossary event to exactly one bucket, preserving order.
pub fn partition_buckets(glossary: Vec<Event>) -> Buckets {
    let mut buckets = Buckets::default();
    for event in glossary {
        match bucket_of(&event) {
            Some(ActionBucket::Updated) => buckets.updated.push(event),
            Some(ActionBucket::Deleted) => buckets.deleted.push(event),
            Some(ActionBucket::Added) => buckets.added.push(event),
            None => {
                tracing::debug!(event_id = %event.id, "glossary event matched no action bucket");
                buckets.unmatched.push(event);
            }
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChangeItem, EventId};
    use chrono::{TimeZone, Utc};

    fn event(id: u64, kind: Option<&str>, title: &str, message: &str) -> Event {
        Event {
            id: EventId::from(id),
            kind: kind.map(str::to_string),
            title: Some(title.to_string()),
            message: Some(message.to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            read: false,
            keyword_details: Vec::new(),
        }
    }

    fn item(action: Option<&str>) -> ChangeItem {
        ChangeItem {
            action: action.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn glossary_detection_heuristics() {
        assert!(is_glossary_event(&event(1, Some("keyword_update"), "", "")));
        assert!(is_glossary_event(&event(2, None, "New KEYWORD", "")));
        assert!(is_glossary_event(&event(3, None, "", "a Keyword changed")));
        assert!(is_glossary_event(&event(4, None, "", "Common Library refreshed")));
        assert!(!is_glossary_event(&event(5, None, "File translated", "done")));
        assert!(!is_glossary_event(&event(6, Some("KEYWORD_UPDATE"), "", "")));
    }

    #[test]
    fn classify_preserves_order() {
        let c = classify(vec![
            event(1, None, "Translation ready", ""),
            event(2, None, "Keyword Updated", ""),
            event(3, None, "Account created", ""),
        ]);
        assert_eq!(c.glossary.len(), 1);
        let ids: Vec<_> = c.passthrough.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn deleted_takes_priority() {
        let mut e = event(1, None, "Keyword Updated", "");
        e.keyword_details = vec![item(Some("updated")), item(Some("deleted"))];
        assert_eq!(bucket_of(&e), Some(ActionBucket::Deleted));

        let e = event(2, None, "Keyword Deleted", "");
        assert_eq!(bucket_of(&e), Some(ActionBucket::Deleted));
    }

    #[test]
    fn updated_beats_added() {
        let mut e = event(1, None, "New Keyword Added", "");
        e.keyword_details = vec![item(Some("updated"))];
        assert_eq!(bucket_of(&e), Some(ActionBucket::Updated));
    }

    #[test]
    fn item_without_action_counts_as_added() {
        let mut e = event(1, Some("keyword_update"), "Glossary", "");
        e.keyword_details = vec![item(None)];
        assert_eq!(bucket_of(&e), Some(ActionBucket::Added));
        assert_eq!(
            bucket_of(&event(2, None, "New Keywords imported", "")),
            Some(ActionBucket::Added)
        );
    }

    #[test]
    fn unmatched_glossary_event_is_dropped() {
        let e = event(9, Some("keyword_update"), "Library sync", "nothing changed");
        assert_eq!(bucket_of(&e), None);

        let buckets = partition_buckets(vec![e]);
        assert!(buckets.updated.is_empty());
        assert!(buckets.deleted.is_empty());
        assert!(buckets.added.is_empty());
        assert_eq!(buckets.unmatched.len(), 1);
    }

    #[test]
    fn each_event_lands_in_one_bucket() {
        let mut a = event(1, None, "Keyword Updated", "");
        a.keyword_details = vec![item(Some("added"))];
        let b = event(2, None, "New Keyword Added", "");
        let mut buckets = partition_buckets(vec![a, b]);

        assert_eq!(buckets.get(ActionBucket::Updated).len(), 1);
        assert_eq!(buckets.take(ActionBucket::Added).len(), 1);
        assert!(buckets.get(ActionBucket::Added).is_empty());
        assert!(buckets.get(ActionBucket::Deleted).is_empty());
    }
}
