/// Identifier utilities for raw events and notifications.
///
/// Consolidated notification IDs follow conventions:
/// - Stable: `consolidated-{bucket}-{anchorEventId}`
/// - Per run: `consolidated-{bucket}-{uuid}-{anchorEventId}`
///
/// Passthrough notifications reuse the ID of the event they wrap.
use std::fmt;
use std::str::FromStr;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::notification::types::ActionBucket;

const CONSOLIDATED_PREFIX: &str = "consolidated-";

/// Opaque identifier of a raw event issued by the backend.
///
/// The backend emits integer primary keys, other feeds use strings. Both are
/// accepted and the ID is always rendered as a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for EventId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(i64),
            UInt(u64),
            Str(String),
            Other(IgnoredAny),
        }

        // Unusable ids decode as empty and are rejected by validation.
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Int(n) => EventId(n.to_string()),
            Repr::UInt(n) => EventId(n.to_string()),
            Repr::Str(s) => EventId(s),
            Repr::Other(_) => EventId::default(),
        })
    }
}

/// Identifier of a notification in the engine output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Deterministic ID for a consolidated group, stable across poll cycles.
    pub fn stable(bucket: ActionBucket, anchor: &EventId) -> Self {
        Self(format!("{CONSOLIDATED_PREFIX}{bucket}-{anchor}"))
    }

    /// Freshly generated ID, different on every pipeline run.
    pub fn per_run(bucket: ActionBucket, anchor: &EventId) -> Self {
        Self(format!("{CONSOLIDATED_PREFIX}{bucket}-{}-{anchor}", Uuid::new_v4()))
    }

    /// ID of a passthrough notification.
    pub fn for_event(id: &EventId) -> Self {
        Self(id.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_consolidated(&self) -> bool {
        self.0.starts_with(CONSOLIDATED_PREFIX)
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How consolidated notification IDs are minted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Derived from `(bucket, anchor event id)`; survives re-polls.
    #[default]
    Stable,
    /// Regenerated on every run, for clients that expect throwaway IDs.
    PerRun,
}

impl IdStrategy {
    pub fn consolidated_id(self, bucket: ActionBucket, anchor: &EventId) -> NotificationId {
        match self {
            IdStrategy::Stable => NotificationId::stable(bucket, anchor),
            IdStrategy::PerRun => NotificationId::per_run(bucket, anchor),
        }
    }
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stable" | "" => Ok(IdStrategy::Stable),
            "per-run" | "per_run" | "perrun" => Ok(IdStrategy::PerRun),
            other => Err(format!("unknown id strategy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_accepts_numbers_and_strings() {
        let ids: Vec<EventId> = serde_json::from_str(r#"[42, "abc"]"#).unwrap();
        assert_eq!(ids[0], EventId::from(42));
        assert_eq!(ids[1].as_str(), "abc");
        assert_eq!(serde_json::to_string(&ids[0]).unwrap(), r#""42""#);
    }

    #[test]
    fn unusable_event_ids_decode_empty() {
        let ids: Vec<EventId> = serde_json::from_str(r#"[null, {"pk": 1}, [2]]"#).unwrap();
        assert!(ids.iter().all(EventId::is_empty));
    }

    #[test]
    fn stable_id_depends_only_on_bucket_and_anchor() {
        let anchor = EventId::from(7);
        let a = NotificationId::stable(ActionBucket::Updated, &anchor);
        let b = NotificationId::stable(ActionBucket::Updated, &anchor);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "consolidated-updated-7");
        assert!(a.is_consolidated());
        assert_ne!(a, NotificationId::stable(ActionBucket::Deleted, &anchor));
    }

    #[test]
    fn per_run_ids_differ_between_runs() {
        let anchor = EventId::from(7);
        let a = IdStrategy::PerRun.consolidated_id(ActionBucket::Added, &anchor);
        let b = IdStrategy::PerRun.consolidated_id(ActionBucket::Added, &anchor);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("consolidated-added-"));
        assert!(a.as_str().ends_with("-7"));
    }

    #[test]
    fn passthrough_id_is_event_id() {
        let id = NotificationId::for_event(&EventId::from("n-1"));
        assert_eq!(id.as_str(), "n-1");
        assert!(!id.is_consolidated());
    }

    #[test]
    fn parse_id_strategy() {
        assert_eq!("stable".parse::<IdStrategy>().unwrap(), IdStrategy::Stable);
        assert_eq!("per-run".parse::<IdStrategy>().unwrap(), IdStrategy::PerRun);
        assert!("random".parse::<IdStrategy>().is_err());
    }
}
