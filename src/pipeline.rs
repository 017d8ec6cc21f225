//! Derives the upcoming/past console lists from a snapshot and filter state.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::models::EventRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilterState {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = Date, example = "2025-11-24")]
    pub date_filter: Option<NaiveDate>,
}

/// An event that survived filtering, with its resolved start instant.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ListedEvent {
    #[serde(flatten)]
    pub record: EventRecord,
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionedView {
    pub upcoming: Vec<ListedEvent>,
    pub past: Vec<ListedEvent>,
}

/// Filters, partitions around `now` and sorts `records`.
///
/// Upcoming events come soonest first, past events most recent first; equal
/// instants are ordered by id. Records whose `scheduled_at` cannot be resolved
/// are left out.
pub fn evaluate<'a, I>(records: I, filters: &FilterState, now: DateTime<Utc>, tz: Tz) -> PartitionedView
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let needle = filters.search_term.to_lowercase();
    let mut view = PartitionedView::default();

    for record in records {
        let starts_at = match record.starts_at(tz) {
            Ok(instant) => instant,
            Err(err) => {
                debug!(error = %err, "skipping event");
                continue;
            }
        };
        if !matches_search(record, &needle) || !matches_date(starts_at, filters.date_filter, tz) {
            continue;
        }

        let listed = ListedEvent {
            record: record.clone(),
            starts_at,
        };
        if starts_at >= now {
            view.upcoming.push(listed);
        } else {
            view.past.push(listed);
        }
    }

    view.upcoming.sort_by(|a, b| {
        a.starts_at
            .cmp(&b.starts_at)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    view.past.sort_by(|a, b| {
        b.starts_at
            .cmp(&a.starts_at)
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    view
}

fn matches_search(record: &EventRecord, needle: &str) -> bool {
    needle.is_empty()
        || record.title.to_lowercase().contains(needle)
        || record.description.to_lowercase().contains(needle)
}

fn matches_date(starts_at: DateTime<Utc>, date_filter: Option<NaiveDate>, tz: Tz) -> bool {
    date_filter.is_none_or(|date| starts_at.with_timezone(&tz).date_naive() == date)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::EventId;

    fn event(id: &str, title: &str, description: &str, scheduled_at: &str) -> EventRecord {
        EventRecord {
            id: EventId::new(id),
            title: title.to_string(),
            description: description.to_string(),
            scheduled_at: scheduled_at.to_string(),
            category: None,
            image_ref: None,
        }
    }

    fn ids(events: &[ListedEvent]) -> Vec<&str> {
        events.iter().map(|e| e.record.id.as_str()).collect()
    }

    fn june_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_partition_and_sort() {
        let events = [
            event("A", "Alpha", "", "2024-01-10T00:00:00Z"),
            event("B", "Beta", "", "2024-01-01T00:00:00Z"),
            event("C", "Gamma", "", "2030-01-01T00:00:00Z"),
        ];
        let view = evaluate(&events, &FilterState::default(), june_first(), chrono_tz::UTC);
        assert_eq!(ids(&view.upcoming), vec!["C"]);
        assert_eq!(ids(&view.past), vec!["A", "B"]);
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let events = [
            event("1", "AI Workshop", "", "2030-01-01T00:00:00Z"),
            event("2", "Sports Fest", "Annual workshop meetup", "2030-02-01T00:00:00Z"),
            event("3", "Movie Night", "Popcorn", "2030-03-01T00:00:00Z"),
        ];
        let filters = FilterState {
            search_term: "workshop".to_string(),
            date_filter: None,
        };
        let view = evaluate(&events, &filters, june_first(), chrono_tz::UTC);
        assert_eq!(ids(&view.upcoming), vec!["1", "2"]);

        let filters = FilterState {
            search_term: "WORKSHOP".to_string(),
            date_filter: None,
        };
        let view = evaluate(&events, &filters, june_first(), chrono_tz::UTC);
        assert_eq!(view.upcoming.len(), 2);
    }

    #[test]
    fn test_date_filter_uses_reference_timezone() {
        // 20:00 UTC on the 9th is already the 10th in Kolkata.
        let events = [
            event("late", "Late", "", "2024-01-09T20:00:00Z"),
            event("early", "Early", "", "2024-01-09T10:00:00Z"),
        ];
        let filters = FilterState {
            search_term: String::new(),
            date_filter: NaiveDate::from_ymd_opt(2024, 1, 10),
        };

        let view = evaluate(&events, &filters, june_first(), chrono_tz::Asia::Kolkata);
        assert_eq!(ids(&view.past), vec!["late"]);

        let view = evaluate(&events, &filters, june_first(), chrono_tz::UTC);
        assert!(view.past.is_empty());
    }

    #[test]
    fn test_search_and_date_combine() {
        let events = [
            event("1", "Workshop", "", "2024-01-10T09:00:00Z"),
            event("2", "Workshop", "", "2024-01-11T09:00:00Z"),
            event("3", "Social", "", "2024-01-10T12:00:00Z"),
        ];
        let filters = FilterState {
            search_term: "work".to_string(),
            date_filter: NaiveDate::from_ymd_opt(2024, 1, 10),
        };
        let view = evaluate(&events, &filters, june_first(), chrono_tz::UTC);
        assert_eq!(ids(&view.past), vec!["1"]);
        assert!(view.upcoming.is_empty());
    }

    #[test]
    fn test_ties_broken_by_id() {
        let events = [
            event("b", "B", "", "2030-01-01T00:00:00Z"),
            event("a", "A", "", "2030-01-01T00:00:00Z"),
            event("d", "D", "", "2020-01-01T00:00:00Z"),
            event("c", "C", "", "2020-01-01T00:00:00Z"),
        ];
        let view = evaluate(&events, &FilterState::default(), june_first(), chrono_tz::UTC);
        assert_eq!(ids(&view.upcoming), vec!["a", "b"]);
        assert_eq!(ids(&view.past), vec!["c", "d"]);
    }

    #[test]
    fn test_event_at_now_is_upcoming() {
        let events = [event("now", "Now", "", "2024-06-01T00:00:00Z")];
        let view = evaluate(&events, &FilterState::default(), june_first(), chrono_tz::UTC);
        assert_eq!(ids(&view.upcoming), vec!["now"]);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let events = [
            event("ok", "Fine", "", "2030-01-01T00:00:00Z"),
            event("bad", "Broken", "", "someday"),
        ];
        let view = evaluate(&events, &FilterState::default(), june_first(), chrono_tz::UTC);
        assert_eq!(ids(&view.upcoming), vec!["ok"]);
        assert!(view.past.is_empty());
    }

    #[test]
    fn test_every_match_lands_in_exactly_one_bucket() {
        let events: Vec<_> = (0..40)
            .map(|i| {
                event(
                    &format!("{i:02}"),
                    if i % 3 == 0 { "Club meetup" } else { "Talk" },
                    "",
                    &format!("2024-{:02}-{:02}T12:00:00Z", i % 12 + 1, i % 27 + 1),
                )
            })
            .collect();
        let filters = FilterState {
            search_term: "meetup".to_string(),
            date_filter: None,
        };
        let view = evaluate(&events, &filters, june_first(), chrono_tz::UTC);

        let expected = events.iter().filter(|e| e.title.contains("meetup")).count();
        let mut seen: Vec<_> = view
            .upcoming
            .iter()
            .chain(view.past.iter())
            .map(|e| e.record.id.clone())
            .collect();
        assert_eq!(seen.len(), expected);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), expected);

        assert!(view.upcoming.iter().all(|e| e.starts_at >= june_first()));
        assert!(view.past.iter().all(|e| e.starts_at < june_first()));
        assert!(view.upcoming.windows(2).all(|w| w[0].starts_at <= w[1].starts_at));
        assert!(view.past.windows(2).all(|w| w[0].starts_at >= w[1].starts_at));
    }
}
