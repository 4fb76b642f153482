use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ChangeItem, Event, NotificationId};

/// Kind of glossary change a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionBucket {
    Added,
    Updated,
    Deleted,
}

impl ActionBucket {
    /// Order in which consolidated notifications are emitted.
    pub const EMIT_ORDER: [ActionBucket; 3] = [
        ActionBucket::Updated,
        ActionBucket::Deleted,
        ActionBucket::Added,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionBucket::Added => "added",
            ActionBucket::Updated => "updated",
            ActionBucket::Deleted => "deleted",
        }
    }

    /// Title of a consolidated notification.
    pub fn title(self) -> &'static str {
        match self {
            ActionBucket::Added => "New Keywords Added",
            ActionBucket::Updated => "Keywords Updated",
            ActionBucket::Deleted => "Keywords Deleted",
        }
    }

    /// Heading of the detail view.
    pub fn heading(self) -> &'static str {
        match self {
            ActionBucket::Added => "NEW KEYWORDS ADDED",
            ActionBucket::Updated => "KEYWORDS UPDATED",
            ActionBucket::Deleted => "KEYWORDS DELETED",
        }
    }

    /// Label of the per-item time column in the detail view.
    pub fn time_label(self) -> &'static str {
        match self {
            ActionBucket::Added => "Added Time",
            ActionBucket::Updated => "Updated Time",
            ActionBucket::Deleted => "Deleted Time",
        }
    }

    /// Summary sentence for `count` affected entries.
    pub fn message(self, count: usize) -> String {
        let plural = count > 1;
        let (noun, verb) = if plural {
            ("keywords", "have")
        } else {
            ("keyword", "has")
        };
        match self {
            ActionBucket::Updated => format!("{count} {noun} {verb} been updated"),
            ActionBucket::Deleted => {
                format!("{count} {noun} {verb} been removed from the library")
            }
            ActionBucket::Added => {
                format!("{count} new {noun} {verb} been added to the library")
            }
        }
    }
}

impl fmt::Display for ActionBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown keyword action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for ActionBucket {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(ActionBucket::Added),
            "updated" => Ok(ActionBucket::Updated),
            "deleted" => Ok(ActionBucket::Deleted),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// Synthetic notification folding one temporal group of glossary events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsolidatedNotification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    /// Time of the group's anchor, the newest event in it.
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub action_type: ActionBucket,
    pub keyword_details: Vec<ChangeItem>,
    pub original_notifications: Vec<Event>,
}

/// Entry of the engine's output list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Consolidated(ConsolidatedNotification),
    Passthrough(Event),
}

impl Notification {
    pub fn id(&self) -> &str {
        match self {
            Notification::Consolidated(n) => n.id.as_str(),
            Notification::Passthrough(e) => e.id.as_str(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Notification::Consolidated(n) => n.created_at,
            Notification::Passthrough(e) => e.created_at,
        }
    }

    pub fn is_read(&self) -> bool {
        match self {
            Notification::Consolidated(n) => n.read,
            Notification::Passthrough(e) => e.read,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Notification::Consolidated(n) => &n.title,
            Notification::Passthrough(e) => e.title(),
        }
    }

    pub fn action_bucket(&self) -> Option<ActionBucket> {
        match self {
            Notification::Consolidated(n) => Some(n.action_type),
            Notification::Passthrough(_) => None,
        }
    }

    pub fn change_items(&self) -> &[ChangeItem] {
        match self {
            Notification::Consolidated(n) => &n.keyword_details,
            Notification::Passthrough(e) => &e.keyword_details,
        }
    }

    /// Events folded into this notification; empty for passthrough.
    pub fn source_events(&self) -> &[Event] {
        match self {
            Notification::Consolidated(n) => &n.original_notifications,
            Notification::Passthrough(_) => &[],
        }
    }
}
