use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::EventId;
use super::timestamp;
use crate::notification::types::ActionBucket;

/// Change event as delivered by the notification feed.
///
/// Decoding is deliberately forgiving: an odd `id` or `created_at` in one
/// row must not reject the whole feed. `created_at` is kept as text and read
/// by [`validate_event`](super::validate::validate_event), which rejects the
/// events the pipeline cannot place in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: EventId,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "timestamp::text")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, alias = "changeItems")]
    pub keyword_details: Option<Vec<ChangeItem>>,
}

/// Validated change event with a known occurrence time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keyword_details: Vec<ChangeItem>,
}

impl Event {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }

    /// Whether any change item of this event carries the given natural key.
    pub fn touches(&self, values: &KeywordValues) -> bool {
        self.keyword_details
            .iter()
            .any(|item| item.values.same_entry(values))
    }
}

/// Language columns of a shared glossary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Japanese,
    English,
    Vietnamese,
    ChineseTraditional,
    ChineseSimplified,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Japanese,
        Language::English,
        Language::Vietnamese,
        Language::ChineseTraditional,
        Language::ChineseSimplified,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Japanese => "japanese",
            Language::English => "english",
            Language::Vietnamese => "vietnamese",
            Language::ChineseTraditional => "chinese_traditional",
            Language::ChineseSimplified => "chinese_simplified",
        }
    }
}

/// Translations of one glossary entry. Any subset may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub japanese: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vietnamese: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chinese_traditional: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chinese_simplified: Option<String>,
}

impl KeywordValues {
    pub fn get(&self, language: Language) -> Option<&str> {
        match language {
            Language::Japanese => self.japanese.as_deref(),
            Language::English => self.english.as_deref(),
            Language::Vietnamese => self.vietnamese.as_deref(),
            Language::ChineseTraditional => self.chinese_traditional.as_deref(),
            Language::ChineseSimplified => self.chinese_simplified.as_deref(),
        }
    }

    /// Natural-key equality on the (japanese, english) pair.
    ///
    /// Case-sensitive. An absent value only matches another absent value and
    /// an empty string only matches an empty string.
    pub fn same_entry(&self, other: &KeywordValues) -> bool {
        self.japanese == other.japanese && self.english == other.english
    }
}

/// One glossary entry touched by an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeItem {
    #[serde(flatten)]
    pub values: KeywordValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(
        default,
        deserialize_with = "timestamp::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "timestamp::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "timestamp::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub added_at: Option<DateTime<Utc>>,
}

impl ChangeItem {
    /// The item's own action, if it names a known one.
    pub fn bucket(&self) -> Option<ActionBucket> {
        self.action
            .as_deref()
            .and_then(|action| ActionBucket::from_str(action).ok())
    }

    pub fn has_action(&self, bucket: ActionBucket) -> bool {
        self.action.as_deref() == Some(bucket.as_str())
    }

    /// Action shown for this item inside a notification of `bucket`.
    pub fn effective_action(&self, bucket: ActionBucket) -> ActionBucket {
        self.bucket().unwrap_or(bucket)
    }

    /// Time of change, whichever of updated/deleted/added is present first.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.deleted_at).or(self.added_at)
    }

    /// Time shown for this item, falling back to the notification time.
    pub fn display_time(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp().unwrap_or(fallback)
    }

    /// Record a change time in the column matching `action`.
    pub fn set_timestamp(&mut self, action: ActionBucket, at: DateTime<Utc>) {
        match action {
            ActionBucket::Updated => self.updated_at = Some(at),
            ActionBucket::Deleted => self.deleted_at = Some(at),
            ActionBucket::Added => self.added_at = Some(at),
        }
    }
}
