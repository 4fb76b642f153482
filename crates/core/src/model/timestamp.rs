//! Lenient timestamp handling for feed data.
//!
//! The backend is not consistent about date formats, so nothing here fails
//! deserialization. Values that cannot be read are left for validation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a feed timestamp.
///
/// Accepts RFC 3339, naive date-times (`T` or space separated, read as UTC),
/// bare dates (midnight UTC) and integer epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(value, format) {
            return Some(at.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|at| at.and_utc());
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Str(String),
    Int(i64),
    Other(IgnoredAny),
}

impl Repr {
    fn into_text(self) -> Option<String> {
        match self {
            Repr::Str(s) => Some(s),
            Repr::Int(n) => Some(n.to_string()),
            Repr::Other(_) => None,
        }
    }
}

/// Keep the raw text of a timestamp field; numbers are stringified and any
/// other JSON shape becomes `None`.
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Repr::deserialize(deserializer)?.into_text())
}

/// Parse a timestamp field, mapping anything unreadable to `None`.
pub fn lenient<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(Repr::deserialize(deserializer)?
        .into_text()
        .as_deref()
        .and_then(parse_timestamp))
}
