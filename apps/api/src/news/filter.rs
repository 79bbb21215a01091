//! Range filter: topic + inclusive date-range selection, newest first.

use crate::news::models::{DateRange, Record, RecordCollection};

/// Returns the records matching `topics` and `range`, sorted by publish time
/// descending with missing timestamps last. Equal timestamps keep input order.
///
/// - `topics` empty or `None`: every topic passes, including missing ones.
/// - `range` `None`: no date test; records without a timestamp are kept.
/// - `range` present: only records with a timestamp inside the inclusive
///   `[start 00:00:00, end 23:59:59]` window pass.
pub fn apply(
    records: &RecordCollection,
    topics: Option<&[String]>,
    range: Option<&DateRange>,
) -> RecordCollection {
    let topics = topics.filter(|t| !t.is_empty());

    let mut matched: Vec<Record> = records
        .records()
        .iter()
        .filter(|r| passes_topic(r, topics))
        .filter(|r| passes_range(r, range))
        .cloned()
        .collect();

    // stable sort keeps input order on ties
    matched.sort_by(|a, b| a.published_at.cmp_newest_first(&b.published_at));
    RecordCollection::new(matched)
}

fn passes_topic(record: &Record, topics: Option<&[String]>) -> bool {
    match topics {
        None => true,
        Some(selected) => record
            .topic
            .as_deref()
            .map(|topic| selected.iter().any(|s| s == topic))
            .unwrap_or(false),
    }
}

fn passes_range(record: &Record, range: Option<&DateRange>) -> bool {
    match range {
        None => true,
        Some(range) => record
            .published_at
            .instant()
            .map(|ts| range.contains(ts))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono_tz::Asia::Seoul;

    use crate::news::models::{ColumnSchema, PublishedAt};
    use crate::news::store::parse_sheet;
    use crate::news::store::tests::SCENARIO_CSV;

    fn scenario() -> RecordCollection {
        parse_sheet(SCENARIO_CSV, &ColumnSchema::default(), Seoul)
            .unwrap()
            .records
    }

    fn record(ts: Option<(i32, u32, u32, u32)>, topic: Option<&str>, title: &str) -> Record {
        Record {
            published_at: match ts {
                Some((y, m, d, h)) => PublishedAt::At(
                    NaiveDate::from_ymd_opt(y, m, d)
                        .unwrap()
                        .and_hms_opt(h, 0, 0)
                        .unwrap(),
                ),
                None => PublishedAt::Missing,
            },
            title: Some(title.to_string()),
            body: None,
            topic: topic.map(str::to_string),
            summary: None,
            newsletter: None,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn topics(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_topic_filter_keeps_missing_timestamp_last() {
        let records = scenario();
        let selected = topics(&["정치"]);
        let result = apply(&records, Some(selected.as_slice()), None);
        let rows = result.records();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], records.records()[0]);
        assert_eq!(rows[1].published_at, PublishedAt::Missing);
    }

    #[test]
    fn test_single_day_range_uses_seoul_wall_clock() {
        let records = scenario();
        let range = DateRange::single_day(day(2024, 1, 6));
        let result = apply(&records, None, Some(&range));
        assert_eq!(result.len(), 1);
        assert_eq!(result.records()[0].topic.as_deref(), Some("경제"));
    }

    #[test]
    fn test_empty_topic_selection_is_no_filter() {
        let records = scenario();
        let empty: Vec<String> = Vec::new();
        assert_eq!(
            apply(&records, Some(empty.as_slice()), None),
            apply(&records, None, None)
        );
    }

    #[test]
    fn test_missing_topic_never_matches_selection() {
        let records = RecordCollection::new(vec![
            record(Some((2024, 1, 1, 0)), None, "untagged"),
            record(Some((2024, 1, 2, 0)), Some("정치"), "tagged"),
        ]);
        let selected = topics(&["정치"]);
        let result = apply(&records, Some(selected.as_slice()), None);
        assert_eq!(result.len(), 1);
        assert_eq!(result.records()[0].title.as_deref(), Some("tagged"));

        let unfiltered = apply(&records, None, None);
        assert_eq!(unfiltered.len(), 2);
    }

    #[test]
    fn test_missing_timestamps_excluded_by_any_range() {
        let records = RecordCollection::new(vec![
            record(None, Some("a"), "no date"),
            record(Some((2024, 1, 1, 12)), Some("a"), "dated"),
        ]);
        let range = DateRange::new(day(1900, 1, 1), day(2999, 12, 31));
        let result = apply(&records, None, Some(&range));
        assert!(result.iter().all(|r| !r.published_at.is_missing()));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_sorted_newest_first_missing_last() {
        let records = RecordCollection::new(vec![
            record(None, None, "m1"),
            record(Some((2024, 1, 1, 0)), None, "old"),
            record(Some((2024, 3, 1, 0)), None, "new"),
            record(None, None, "m2"),
            record(Some((2024, 2, 1, 0)), None, "mid"),
        ]);
        let result = apply(&records, None, None);
        let titles: Vec<_> = result.iter().map(|r| r.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["new", "mid", "old", "m1", "m2"]);

        for pair in result.records().windows(2) {
            if let (Some(a), Some(b)) = (pair[0].published_at.instant(), pair[1].published_at.instant()) {
                assert!(a >= b);
            }
        }
    }

    #[test]
    fn test_ties_keep_input_order() {
        let records = RecordCollection::new(vec![
            record(Some((2024, 1, 1, 9)), None, "first"),
            record(Some((2024, 1, 1, 9)), None, "second"),
            record(Some((2024, 1, 1, 9)), None, "third"),
        ]);
        let result = apply(&records, None, None);
        let titles: Vec<_> = result.iter().map(|r| r.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_range_edges_inclusive() {
        let records = RecordCollection::new(vec![
            Record {
                published_at: PublishedAt::At(day(2024, 1, 5).and_hms_opt(23, 59, 59).unwrap()),
                ..record(None, None, "end edge")
            },
            Record {
                published_at: PublishedAt::At(day(2024, 1, 3).and_hms_opt(0, 0, 0).unwrap()),
                ..record(None, None, "start edge")
            },
            record(Some((2024, 1, 6, 0)), None, "after"),
            record(Some((2024, 1, 2, 23)), None, "before"),
        ]);
        let range = DateRange::new(day(2024, 1, 3), day(2024, 1, 5));
        let result = apply(&records, None, Some(&range));
        let titles: Vec<_> = result.iter().map(|r| r.title.as_deref().unwrap()).collect();
        assert_eq!(titles, vec!["end edge", "start edge"]);
    }

    #[test]
    fn test_idempotent() {
        let records = scenario();
        let selected = topics(&["정치", "경제"]);
        let range = DateRange::new(day(2024, 1, 1), day(2024, 1, 31));
        let once = apply(&records, Some(selected.as_slice()), Some(&range));
        let twice = apply(&once, Some(selected.as_slice()), Some(&range));
        assert_eq!(once, twice);

        let once = apply(&records, Some(selected.as_slice()), None);
        assert_eq!(apply(&once, Some(selected.as_slice()), None), once);
    }

    #[test]
    fn test_input_not_mutated() {
        let records = scenario();
        let before = records.clone();
        let _ = apply(&records, None, None);
        assert_eq!(records, before);
    }

    #[test]
    fn test_range_result_is_subset_of_unranged() {
        let records = scenario();
        let range = DateRange::new(day(2024, 1, 5), day(2024, 1, 6));
        let unranged = apply(&records, None, None);
        let ranged = apply(&records, None, Some(&range));
        assert!(ranged.len() <= unranged.len());
        assert!(ranged.iter().all(|r| unranged.iter().any(|u| u == r)));
    }
}
