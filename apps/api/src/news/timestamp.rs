//! Timestamp parsing and normalization into reference-zone wall-clock time.
//!
//! The sheet is edited by hand, so the publish column mixes offset-qualified
//! values (`2024-01-05T10:00:00Z`), bare local values (`2024-01-06 09:00`) and
//! noise. Parsing is a two-outcome step: a value is either recognised as an
//! instant or it is `Unparseable`. Nothing here returns an error.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;

use crate::news::models::PublishedAt;

/// Offset-qualified layouts, tried after RFC 3339 / RFC 2822.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M %:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Zone-naive layouts. `%.f` also matches when no fraction is present.
const WALL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S%.f",
    "%Y.%m.%d %H:%M",
    // en-US Sheets locale
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%m/%d/%Y"];

const UTC_SUFFIXES: &[&str] = &["Z", "z", " UTC", " GMT"];

/// Result of reading one raw publish value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedInstant {
    /// Carried an explicit offset.
    Zoned(DateTime<FixedOffset>),
    /// No zone information; taken to be reference-zone wall-clock time.
    Wall(NaiveDateTime),
    Unparseable,
}

pub fn parse_instant(raw: &str) -> ParsedInstant {
    let text = raw.trim();
    if text.is_empty() {
        return ParsedInstant::Unparseable;
    }

    if let Some(dt) = parse_zoned(text) {
        return ParsedInstant::Zoned(dt);
    }
    if let Some(naive) = parse_wall(text) {
        return ParsedInstant::Wall(naive);
    }
    ParsedInstant::Unparseable
}

/// Converts a parsed instant into the reference zone and drops the zone tag.
/// Wall-clock values pass through untouched.
pub fn normalize(parsed: ParsedInstant, zone: Tz) -> PublishedAt {
    match parsed {
        ParsedInstant::Zoned(dt) => PublishedAt::At(dt.with_timezone(&zone).naive_local()),
        ParsedInstant::Wall(naive) => PublishedAt::At(naive),
        ParsedInstant::Unparseable => PublishedAt::Missing,
    }
}

pub fn normalize_raw(raw: Option<&str>, zone: Tz) -> PublishedAt {
    match raw {
        Some(value) => normalize(parse_instant(value), zone),
        None => PublishedAt::Missing,
    }
}

fn parse_zoned(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt);
    }

    let utc_head = UTC_SUFFIXES
        .iter()
        .find_map(|suffix| text.strip_suffix(suffix))
        .filter(|head| head.ends_with(|c: char| c.is_ascii_digit()));

    match utc_head {
        Some(head) => {
            let candidate = format!("{head}+00:00");
            ZONED_FORMATS
                .iter()
                .find_map(|fmt| DateTime::parse_from_str(&candidate, fmt).ok())
                .or_else(|| utc_midnight(head))
        }
        None => ZONED_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok()),
    }
}

/// `2024-01-05 UTC`: a bare date tagged as UTC means midnight UTC.
fn utc_midnight(head: &str) -> Option<DateTime<FixedOffset>> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head.trim_end(), fmt).ok())
        .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
}

fn parse_wall(text: &str) -> Option<NaiveDateTime> {
    if let Some(naive) = WALL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(naive);
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date.and_time(NaiveTime::MIN));
    }
    parse_sheets_korean_locale(text)
}

/// Google Sheets exports under the ko_KR locale look like
/// `2024. 1. 5 오후 3:00:00` or just `2024. 1. 5`.
fn parse_sheets_korean_locale(text: &str) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }

    let mut ymd = tokens[..3]
        .iter()
        .map(|t| t.trim_end_matches('.').parse::<u32>().ok());
    let year = i32::try_from(ymd.next()??).ok()?;
    let month = ymd.next()??;
    let day = ymd.next()??;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let time = match &tokens[3..] {
        [] => NaiveTime::MIN,
        [clock] => parse_clock(clock, None)?,
        [meridiem, clock] => parse_clock(clock, Some(meridiem))?,
        _ => return None,
    };
    Some(date.and_time(time))
}

fn parse_clock(clock: &str, meridiem: Option<&str>) -> Option<NaiveTime> {
    let mut parts = clock.split(':');
    let mut hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    let second: u32 = match parts.next() {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }

    match meridiem {
        None => {}
        Some("오전") if (1..=12).contains(&hour) => hour %= 12,
        Some("오후") if (1..=12).contains(&hour) => hour = hour % 12 + 12,
        Some(_) => return None,
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}
