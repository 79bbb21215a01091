use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Publish time of a record, already expressed as reference-zone wall-clock time.
///
/// `Missing` covers both an absent column and a value that could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishedAt {
    At(NaiveDateTime),
    Missing,
}

impl PublishedAt {
    pub fn instant(&self) -> Option<NaiveDateTime> {
        match self {
            PublishedAt::At(ts) => Some(*ts),
            PublishedAt::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, PublishedAt::Missing)
    }

    /// Newest first; `Missing` always after every present value.
    pub fn cmp_newest_first(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PublishedAt::At(a), PublishedAt::At(b)) => b.cmp(a),
            (PublishedAt::At(_), PublishedAt::Missing) => Ordering::Less,
            (PublishedAt::Missing, PublishedAt::At(_)) => Ordering::Greater,
            (PublishedAt::Missing, PublishedAt::Missing) => Ordering::Equal,
        }
    }
}

/// One news row with the fixed six-field shape.
/// Text fields use `None` as the missing sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub published_at: PublishedAt,
    pub title: Option<String>,
    pub body: Option<String>,
    pub topic: Option<String>,
    pub summary: Option<String>,
    pub newsletter: Option<String>,
}

/// Immutable set of records produced by one load. Order carries no meaning
/// unless the collection came out of the range filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordCollection {
    records: Vec<Record>,
}

impl RecordCollection {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

/// Inclusive calendar-date range selected by a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// `[start 00:00:00, end 23:59:59]` in the same wall-clock representation
    /// as `PublishedAt`.
    pub fn instant_bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        (
            self.start.and_time(NaiveTime::MIN),
            self.end.and_time(end_of_day),
        )
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        let (lo, hi) = self.instant_bounds();
        lo <= ts && ts <= hi
    }
}

/// Names of the six required columns in the raw sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub published_at: String,
    pub title: String,
    pub body: String,
    pub topic: String,
    pub summary: String,
    pub newsletter: String,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            published_at: "날짜".to_string(),
            title: "제목".to_string(),
            body: "본문".to_string(),
            topic: "토픽 분류".to_string(),
            summary: "요약".to_string(),
            newsletter: "뉴스레터".to_string(),
        }
    }
}
