use std::collections::BTreeSet;
use std::fmt::Write;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::news::models::{PublishedAt, Record, RecordCollection};

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const UNTITLED: &str = "제목 없음";

/// Renders a publish time as `YYYY-MM-DD HH:MM`. Missing values, and any
/// formatting failure, render as an empty string.
pub fn format_published(ts: &PublishedAt) -> String {
    let PublishedAt::At(ts) = ts else {
        return String::new();
    };
    let mut out = String::new();
    match write!(out, "{}", ts.format(DISPLAY_FORMAT)) {
        Ok(()) => out,
        Err(_) => String::new(),
    }
}

/// One record as shown to a reader.
#[derive(Debug, Clone, Serialize)]
pub struct NewsItemView {
    pub title: String,
    /// Possibly empty.
    pub date: String,
    pub topic: Option<String>,
    /// Collapsed by default in the reader.
    pub summary: String,
    pub newsletter: String,
    pub body: String,
}

impl From<&Record> for NewsItemView {
    fn from(record: &Record) -> Self {
        Self {
            title: record
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            date: format_published(&record.published_at),
            topic: record.topic.clone(),
            summary: record.summary.clone().unwrap_or_default(),
            newsletter: record.newsletter.clone().unwrap_or_default(),
            body: record.body.clone().unwrap_or_default(),
        }
    }
}

/// Options for the topic multi-select and bounds for the date picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facets {
    pub topics: Vec<String>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
}

pub fn facets(records: &RecordCollection, today: NaiveDate) -> Facets {
    let topics: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.topic.as_deref())
        .collect();

    let dates = records.iter().filter_map(|r| r.published_at.instant());
    let (min_date, max_date) = dates
        .fold(None, |acc: Option<(_, _)>, ts| match acc {
            None => Some((ts, ts)),
            Some((lo, hi)) => Some((lo.min(ts), hi.max(ts))),
        })
        .map(|(lo, hi)| (lo.date(), hi.date()))
        .unwrap_or((today, today));

    Facets {
        topics: topics.into_iter().map(str::to_string).collect(),
        min_date,
        max_date,
    }
}

/// Current calendar date in the reference zone.
pub fn today_in(zone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&zone).date_naive()
}
