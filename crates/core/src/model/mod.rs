pub mod event;
pub mod id;
pub mod timestamp;
pub mod validate;

pub use event::{ChangeItem, Event, KeywordValues, Language, RawEvent};
pub use id::{EventId, IdStrategy, NotificationId};
pub use timestamp::parse_timestamp;
pub use validate::{validate_event, ValidationError};
