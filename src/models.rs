use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Local date-time layouts accepted for `scheduled_at` when no offset is given.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Identifier assigned by the event store. Arrives as a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "evt_42")]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => EventId(text),
            Raw::Number(number) => EventId(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "robotics-club")]
pub struct ClubId(String);

impl ClubId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schema(example = "2025-11-24T18:00:00+05:30")]
    pub scheduled_at: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_ref: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
#[error("event {id} has unparseable scheduled_at {raw:?}")]
pub struct MalformedRecord {
    pub id: EventId,
    pub raw: String,
}

impl EventRecord {
    /// Resolves `scheduled_at` to an absolute instant. Offset-less values are
    /// read as wall-clock time in `tz`.
    pub fn starts_at(&self, tz: Tz) -> Result<DateTime<Utc>, MalformedRecord> {
        parse_scheduled_at(&self.scheduled_at, tz).ok_or_else(|| MalformedRecord {
            id: self.id.clone(),
            raw: self.scheduled_at.clone(),
        })
    }
}

fn parse_scheduled_at(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|local| tz.from_local_datetime(&local).earliest())
        .map(|instant| instant.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(scheduled_at: &str) -> EventRecord {
        EventRecord {
            id: EventId::new("1"),
            title: "Hack Night".to_string(),
            description: String::new(),
            scheduled_at: scheduled_at.to_string(),
            category: None,
            image_ref: None,
        }
    }

    #[test]
    fn test_starts_at_rfc3339() {
        let parsed = record("2024-01-10T18:00:00+05:30")
            .starts_at(chrono_tz::UTC)
            .unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 10, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_starts_at_local_uses_reference_timezone() {
        let parsed = record("2024-01-10 18:00")
            .starts_at(chrono_tz::Asia::Kolkata)
            .unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 10, 12, 30, 0).unwrap());

        let parsed = record("2024-01-10T18:00").starts_at(chrono_tz::UTC).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 10, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_starts_at_nonexistent_local_time() {
        // Clocks jump from 02:00 to 03:00 in New York on this date.
        let err = record("2024-03-10T02:30:00")
            .starts_at(chrono_tz::America::New_York)
            .unwrap_err();
        assert_eq!(err.id, EventId::new("1"));
    }

    #[test]
    fn test_starts_at_garbage() {
        assert!(record("next tuesday").starts_at(chrono_tz::UTC).is_err());
        assert!(record("").starts_at(chrono_tz::UTC).is_err());
    }

    #[test]
    fn test_deserialize_numeric_id_and_defaults() {
        let parsed: EventRecord =
            serde_json::from_str(r#"{"id": 17, "title": "Expo", "scheduled_at": "2024-01-10T10:00"}"#)
                .unwrap();
        assert_eq!(parsed.id, EventId::new("17"));
        assert_eq!(parsed.description, "");
        assert!(parsed.category.is_none());
    }
}
