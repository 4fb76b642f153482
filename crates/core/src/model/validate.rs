/// Event validation.
/// An event the pipeline cannot place in time is rejected here, never clustered.
use thiserror::Error;

use super::event::{Event, RawEvent};
use super::id::EventId;
use super::timestamp::parse_timestamp;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event id cannot be empty")]
    EmptyId,
    #[error("event {0} has no created_at")]
    MissingCreatedAt(EventId),
    #[error("event {id} has an unreadable created_at {value:?}")]
    InvalidCreatedAt { id: EventId, value: String },
}

/// Validate that a raw event has the fields the pipeline depends on.
pub fn validate_event(raw: RawEvent) -> Result<Event, ValidationError> {
    if raw.id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    let Some(value) = raw.created_at else {
        return Err(ValidationError::MissingCreatedAt(raw.id));
    };
    let Some(created_at) = parse_timestamp(&value) else {
        return Err(ValidationError::InvalidCreatedAt { id: raw.id, value });
    };

    Ok(Event {
        id: raw.id,
        kind: raw.kind,
        title: raw.title,
        message: raw.message,
        created_at,
        read: raw.read,
        keyword_details: raw.keyword_details.unwrap_or_default(),
    })
}

impl TryFrom<RawEvent> for Event {
    type Error = ValidationError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        validate_event(raw)
    }
}
