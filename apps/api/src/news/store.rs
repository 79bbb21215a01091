use std::collections::HashMap;
use std::sync::Arc;

use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{info, warn};

use crate::news::models::{ColumnSchema, Record, RecordCollection};
use crate::news::timestamp::normalize_raw;
use crate::sheet_client::{RecordSource, SourceError};

/// Whether the last load reached the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Available,
    Unavailable { reason: String },
}

impl SourceStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, SourceStatus::Available)
    }
}

/// Output of one `RecordStore::load`. An unavailable source always comes
/// with an empty collection.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub records: RecordCollection,
    pub status: SourceStatus,
}

/// CSV text parsed into fixed-shape records.
#[derive(Debug)]
pub struct ParsedSheet {
    pub records: RecordCollection,
    /// Lines dropped for carrying more fields than the header.
    pub skipped_lines: usize,
}

/// Turns the raw sheet export into a `RecordCollection`.
pub struct RecordStore {
    source: Arc<dyn RecordSource>,
    columns: ColumnSchema,
    zone: Tz,
}

impl RecordStore {
    pub fn new(source: Arc<dyn RecordSource>, columns: ColumnSchema, zone: Tz) -> Self {
        Self {
            source,
            columns,
            zone,
        }
    }

    /// Fetches and normalizes the sheet. Never fails: a broken source is
    /// reported through `SourceStatus::Unavailable` with no records.
    pub async fn load(&self) -> LoadOutcome {
        let parsed = self
            .source
            .fetch_csv()
            .await
            .and_then(|text| parse_sheet(&text, &self.columns, self.zone));

        match parsed {
            Ok(sheet) => {
                let undated = sheet
                    .records
                    .iter()
                    .filter(|r| r.published_at.is_missing())
                    .count();
                info!(
                    "Loaded {} news records ({} without a usable date, {} malformed lines skipped)",
                    sheet.records.len(),
                    undated,
                    sheet.skipped_lines
                );
                LoadOutcome {
                    records: sheet.records,
                    status: SourceStatus::Available,
                }
            }
            Err(e) => {
                warn!("News source unavailable: {e}");
                LoadOutcome {
                    records: RecordCollection::empty(),
                    status: SourceStatus::Unavailable {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }
}

/// Positions of the required columns within the header, `None` when absent.
struct ColumnIndex {
    published_at: Option<usize>,
    title: Option<usize>,
    body: Option<usize>,
    topic: Option<usize>,
    summary: Option<usize>,
    newsletter: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, columns: &ColumnSchema) -> Self {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (i, name) in headers.iter().enumerate() {
            let name = name.trim_start_matches('\u{feff}').trim();
            // first occurrence wins on duplicate headers
            positions.entry(name).or_insert(i);
        }
        let find = |name: &str| positions.get(name.trim()).copied();

        Self {
            published_at: find(&columns.published_at),
            title: find(&columns.title),
            body: find(&columns.body),
            topic: find(&columns.topic),
            summary: find(&columns.summary),
            newsletter: find(&columns.newsletter),
        }
    }
}

fn cell(row: &StringRecord, position: Option<usize>) -> Option<&str> {
    position
        .and_then(|i| row.get(i))
        .filter(|value| !value.is_empty())
}

pub fn parse_sheet(
    text: &str,
    columns: &ColumnSchema,
    zone: Tz,
) -> Result<ParsedSheet, SourceError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SourceError::Malformed(format!("unreadable header row: {e}")))?
        .clone();
    if headers.is_empty() {
        return Err(SourceError::Malformed("missing header row".to_string()));
    }
    let index = ColumnIndex::resolve(&headers, columns);

    let mut records = Vec::new();
    let mut skipped_lines = 0;

    for (line, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping unreadable CSV line {}: {e}", line + 2);
                skipped_lines += 1;
                continue;
            }
        };
        if row.len() > headers.len() {
            warn!(
                "Skipping CSV line {}: expected {} fields, found {}",
                line + 2,
                headers.len(),
                row.len()
            );
            skipped_lines += 1;
            continue;
        }

        let field = |position: Option<usize>| cell(&row, position).map(str::to_string);
        records.push(Record {
            published_at: normalize_raw(cell(&row, index.published_at), zone),
            title: field(index.title),
            body: field(index.body),
            topic: field(index.topic),
            summary: field(index.summary),
            newsletter: field(index.newsletter),
        });
    }

    Ok(ParsedSheet {
        records: RecordCollection::new(records),
        skipped_lines,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use chrono_tz::Asia::Seoul;

    use crate::news::models::PublishedAt;

    pub(crate) const SCENARIO_CSV: &str = "날짜,토픽 분류\n\
        2024-01-05T10:00:00Z,정치\n\
        2024-01-06 09:00,경제\n\
        garbage,정치\n";

    /// Serves fixed CSV text, or fails when `csv` is `None`.
    pub(crate) struct StubSource {
        pub csv: Option<String>,
    }

    #[async_trait]
    impl RecordSource for StubSource {
        async fn fetch_csv(&self) -> Result<String, SourceError> {
            self.csv
                .clone()
                .ok_or(SourceError::Status { status: 404 })
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> PublishedAt {
        PublishedAt::At(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
    }

    fn parse(text: &str) -> ParsedSheet {
        parse_sheet(text, &ColumnSchema::default(), Seoul).unwrap()
    }

    #[test]
    fn test_scenario_rows_normalized() {
        let sheet = parse(SCENARIO_CSV);
        let rows = sheet.records.records();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].published_at, at(2024, 1, 5, 19, 0));
        assert_eq!(rows[1].published_at, at(2024, 1, 6, 9, 0));
        assert_eq!(rows[2].published_at, PublishedAt::Missing);
        assert_eq!(rows[0].topic.as_deref(), Some("정치"));
    }

    #[test]
    fn test_absent_columns_become_missing() {
        let sheet = parse(SCENARIO_CSV);
        for record in sheet.records.iter() {
            assert_eq!(record.title, None);
            assert_eq!(record.body, None);
            assert_eq!(record.summary, None);
            assert_eq!(record.newsletter, None);
        }
    }

    #[test]
    fn test_header_names_trimmed() {
        let sheet = parse(" 날짜 ,  제목\n2024-01-06 09:00,hello\n");
        let record = &sheet.records.records()[0];
        assert_eq!(record.published_at, at(2024, 1, 6, 9, 0));
        assert_eq!(record.title.as_deref(), Some("hello"));
    }

    #[test]
    fn test_bom_stripped_from_first_header() {
        let sheet = parse("\u{feff}날짜,제목\n2024-01-06 09:00,hello\n");
        assert_eq!(
            sheet.records.records()[0].published_at,
            at(2024, 1, 6, 9, 0)
        );
    }

    #[test]
    fn test_overlong_lines_skipped_short_lines_padded() {
        let sheet = parse("날짜,제목,요약\n2024-01-06 09:00,a,b,extra\n2024-01-07 09:00,only\n");
        assert_eq!(sheet.skipped_lines, 1);
        let rows = sheet.records.records();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title.as_deref(), Some("only"));
        assert_eq!(rows[0].summary, None);
    }

    #[test]
    fn test_empty_cells_are_missing_text_kept_verbatim() {
        let sheet = parse("날짜,제목,본문\n,,  spaced  \n");
        let record = &sheet.records.records()[0];
        assert_eq!(record.published_at, PublishedAt::Missing);
        assert_eq!(record.title, None);
        assert_eq!(record.body.as_deref(), Some("  spaced  "));
    }

    #[test]
    fn test_duplicate_header_first_wins() {
        let sheet = parse("제목,제목\nfirst,second\n");
        assert_eq!(sheet.records.records()[0].title.as_deref(), Some("first"));
    }

    #[test]
    fn test_quoted_multiline_cells() {
        let sheet = parse("제목,뉴스레터\n\"a, b\",\"line1\nline2\"\n");
        let record = &sheet.records.records()[0];
        assert_eq!(record.title.as_deref(), Some("a, b"));
        assert_eq!(record.newsletter.as_deref(), Some("line1\nline2"));
    }

    #[test]
    fn test_custom_column_names() {
        let columns = ColumnSchema {
            published_at: "published".to_string(),
            topic: "tag".to_string(),
            ..ColumnSchema::default()
        };
        let sheet = parse_sheet("published,tag\n2024-01-06 09:00,tech\n", &columns, Seoul).unwrap();
        let record = &sheet.records.records()[0];
        assert_eq!(record.topic.as_deref(), Some("tech"));
        assert!(!record.published_at.is_missing());
    }

    #[tokio::test]
    async fn test_load_reports_available() {
        let store = RecordStore::new(
            Arc::new(StubSource {
                csv: Some(SCENARIO_CSV.to_string()),
            }),
            ColumnSchema::default(),
            Seoul,
        );
        let outcome = store.load().await;
        assert!(outcome.status.is_available());
        assert_eq!(outcome.records.len(), 3);
    }

    #[tokio::test]
    async fn test_load_failure_yields_empty_unavailable() {
        let store = RecordStore::new(
            Arc::new(StubSource { csv: None }),
            ColumnSchema::default(),
            Seoul,
        );
        let outcome = store.load().await;
        assert!(outcome.records.is_empty());
        assert!(matches!(outcome.status, SourceStatus::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let store = RecordStore::new(
            Arc::new(StubSource {
                csv: Some(SCENARIO_CSV.to_string()),
            }),
            ColumnSchema::default(),
            Seoul,
        );
        let first = store.load().await;
        let second = store.load().await;
        assert_eq!(first.records, second.records);
    }
}
