use chrono::Duration;
use icalendar::{Calendar, Component, Event, EventLike};

use crate::models::ClubId;
use crate::pipeline::ListedEvent;

const DEFAULT_DURATION_HOURS: i64 = 1;

#[derive(Clone, Default)]
pub struct ICalExporter;

impl ICalExporter {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, club_id: &ClubId, events: &[ListedEvent]) -> Vec<u8> {
        let mut calendar = Calendar::new();
        calendar.name(&format!("{club_id} events"));

        for item in events {
            let record = &item.record;
            let mut event = Event::new();
            event.summary(&record.title);
            event.starts(item.starts_at);
            event.ends(item.starts_at + Duration::hours(DEFAULT_DURATION_HOURS));
            if !record.description.is_empty() {
                event.description(&record.description);
            }
            if let Some(category) = &record.category {
                event.add_property("CATEGORIES", category);
            }
            event.uid(&format!("{}-{}@club-events-console", club_id, record.id));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{EventId, EventRecord};

    fn listed(id: &str, title: &str, category: Option<&str>) -> ListedEvent {
        ListedEvent {
            record: EventRecord {
                id: EventId::new(id),
                title: title.to_string(),
                description: "Bring a laptop".to_string(),
                scheduled_at: "2030-01-01T18:00:00Z".to_string(),
                category: category.map(str::to_string),
                image_ref: None,
            },
            starts_at: Utc.with_ymd_and_hms(2030, 1, 1, 18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_generate_events() {
        let exporter = ICalExporter::new();
        let bytes = exporter.generate(
            &ClubId::new("robotics"),
            &[listed("1", "Hack Night", Some("Tech")), listed("2", "Demo Day", None)],
        );
        let body = String::from_utf8(bytes).unwrap();
        assert!(body.contains("BEGIN:VCALENDAR"));
        assert_eq!(body.matches("BEGIN:VEVENT").count(), 2);
        assert!(body.contains("SUMMARY:Hack Night"));
        assert!(body.contains("CATEGORIES:Tech"));
        assert!(body.contains("robotics-1@club-events-console"));
        assert!(body.contains("DTSTART:20300101T180000Z"));
    }

    #[test]
    fn test_generate_empty_calendar() {
        let exporter = ICalExporter::new();
        let body = String::from_utf8(exporter.generate(&ClubId::new("robotics"), &[])).unwrap();
        assert!(body.contains("BEGIN:VCALENDAR"));
        assert!(!body.contains("BEGIN:VEVENT"));
    }
}
