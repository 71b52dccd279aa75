//! Per-class statistics aggregation.
//!
//! Reduces a snapshot of stored events for one class into per-student and
//! per-date event counts. Results are recomputed on every request and never
//! persisted; input records are only read, never mutated.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Error;
use crate::event::{Event, StoredEvent, format_event_time};

/// Derived per-class event counts.
///
/// Maps are keyed, not sequenced; no iteration order is promised to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassEventStatistics {
    pub class_sourced_id: String,
    pub total_events: usize,
    /// Number of distinct users with at least one event.
    pub total_student_enrollments: usize,
    /// Class-wide date-string -> event count.
    pub event_count_grouped_by_date: HashMap<String, u64>,
    /// Per-user date-string -> event count.
    pub event_count_grouped_by_date_and_student: HashMap<String, HashMap<String, u64>>,
}

/// Reduces a class's stored events into [`ClassEventStatistics`].
///
/// The class id is taken from the caller, not re-derived from the records.
/// An empty input is a caller error ([`Error::NotFound`]), not an
/// empty-statistics result.
pub fn aggregate(class_id: &str, records: &[StoredEvent]) -> Result<ClassEventStatistics, Error> {
    if records.is_empty() {
        return Err(Error::NotFound(format!(
            "no events found for class {class_id}"
        )));
    }

    let mut by_date: HashMap<String, u64> = HashMap::new();
    let mut by_date_and_student: HashMap<String, HashMap<String, u64>> = HashMap::new();

    for record in records {
        let date = date_bucket(&record.event);
        *by_date.entry(date.clone()).or_default() += 1;
        *by_date_and_student
            .entry(record.user_id.clone())
            .or_default()
            .entry(date)
            .or_default() += 1;
    }

    Ok(ClassEventStatistics {
        class_sourced_id: class_id.to_string(),
        total_events: records.len(),
        total_student_enrollments: by_date_and_student.len(),
        event_count_grouped_by_date: by_date,
        event_count_grouped_by_date_and_student: by_date_and_student,
    })
}

/// Derives the calendar-date bucket for an event by truncating its serialized
/// timestamp at the first `T`.
///
/// This is deliberately a string operation on the already-serialized form,
/// not a timezone-aware date extraction: the buckets define boundaries
/// consumed by downstream callers and must not shift.
fn date_bucket(event: &Event) -> String {
    let text = event.event_time.map(format_event_time).unwrap_or_default();
    match text.split_once('T') {
        Some((date, _)) => date.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use chrono::{TimeZone, Utc};

    fn record(user_id: &str, year: i32, month: u32, day: u32) -> StoredEvent {
        StoredEvent {
            storage_id: None,
            tenant_id: "tenant-1".to_string(),
            organization_id: "org-1".to_string(),
            class_id: "class-1".to_string(),
            user_id: user_id.to_string(),
            event: Event {
                id: format!("event-{user_id}-{year}{month}{day}"),
                event_time: Some(Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()),
                ..Event::default()
            },
        }
    }

    #[test]
    fn aggregate_counts_by_date_and_student() {
        let records = vec![
            record("user-a", 2020, 1, 1),
            record("user-a", 2020, 1, 1),
            record("user-a", 2020, 1, 2),
            record("user-b", 2020, 1, 1),
        ];

        let stats = aggregate("class-1", &records).unwrap();

        assert_eq!(stats.class_sourced_id, "class-1");
        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.total_student_enrollments, 2);

        assert_eq!(stats.event_count_grouped_by_date.len(), 2);
        assert_eq!(stats.event_count_grouped_by_date["2020-01-01"], 3);
        assert_eq!(stats.event_count_grouped_by_date["2020-01-02"], 1);

        let user_a = &stats.event_count_grouped_by_date_and_student["user-a"];
        assert_eq!(user_a["2020-01-01"], 2);
        assert_eq!(user_a["2020-01-02"], 1);
        let user_b = &stats.event_count_grouped_by_date_and_student["user-b"];
        assert_eq!(user_b.len(), 1);
        assert_eq!(user_b["2020-01-01"], 1);
    }

    #[test]
    fn aggregate_rejects_empty_input() {
        assert!(matches!(
            aggregate("class-1", &[]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn statistics_serialize_with_camel_case_keys() {
        let stats = aggregate("class-1", &[record("user-a", 2020, 1, 1)]).unwrap();
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["classSourcedId"], "class-1");
        assert_eq!(json["totalEvents"], 1);
        assert_eq!(json["totalStudentEnrollments"], 1);
        assert_eq!(json["eventCountGroupedByDate"]["2020-01-01"], 1);
        assert_eq!(
            json["eventCountGroupedByDateAndStudent"]["user-a"]["2020-01-01"],
            1
        );
    }
}
