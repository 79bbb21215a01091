//! Axum route handlers for the News API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::news::display::{facets, today_in, Facets, NewsItemView};
use crate::news::filter::apply;
use crate::news::models::DateRange;
use crate::news::store::SourceStatus;
use crate::state::AppState;

pub const NOTICE_UNAVAILABLE: &str =
    "데이터를 불러오는 데 실패했습니다. 스프레드시트 공개 설정(보기 권한) 또는 URL을 확인해 주세요.";
pub const NOTICE_NO_DATA: &str =
    "표시할 데이터가 없습니다. 스프레드시트에 데이터가 있는지 확인해 주세요.";
pub const NOTICE_NO_MATCH: &str = "선택한 조건에 해당하는 뉴스가 없습니다.";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    /// Comma-separated topic tags.
    pub topics: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl NewsQuery {
    fn selected_topics(&self) -> Vec<String> {
        self.topics
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A lone `start` or `end` selects that single day.
    fn date_range(&self) -> Result<Option<DateRange>, AppError> {
        let range = match (self.start, self.end) {
            (None, None) => return Ok(None),
            (Some(day), None) | (None, Some(day)) => DateRange::single_day(day),
            (Some(start), Some(end)) => DateRange::new(start, end),
        };
        if range.start > range.end {
            return Err(AppError::Validation(format!(
                "start ({}) must not be after end ({})",
                range.start, range.end
            )));
        }
        Ok(Some(range))
    }
}

#[derive(Debug, Serialize)]
pub struct AppliedFilter {
    pub topics: Vec<String>,
    pub range: Option<DateRange>,
}

#[derive(Debug, Serialize)]
pub struct NewsListResponse {
    pub source: SourceStatus,
    pub notice: Option<&'static str>,
    pub filter: AppliedFilter,
    pub total: usize,
    pub items: Vec<NewsItemView>,
}

#[derive(Debug, Serialize)]
pub struct FacetsResponse {
    pub source: SourceStatus,
    #[serde(flatten)]
    pub facets: Facets,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub records: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/news
pub async fn handle_list_news(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<NewsListResponse>, AppError> {
    let range = query.date_range()?;
    let topics = query.selected_topics();

    let snapshot = state.records.refresh_if_stale().await;
    let matched = apply(&snapshot.records, Some(topics.as_slice()), range.as_ref());

    let notice = if !snapshot.status.is_available() {
        Some(NOTICE_UNAVAILABLE)
    } else if snapshot.records.is_empty() {
        Some(NOTICE_NO_DATA)
    } else if matched.is_empty() {
        Some(NOTICE_NO_MATCH)
    } else {
        None
    };

    Ok(Json(NewsListResponse {
        source: snapshot.status.clone(),
        notice,
        filter: AppliedFilter { topics, range },
        total: matched.len(),
        items: matched.iter().map(NewsItemView::from).collect(),
    }))
}

/// GET /api/v1/news/facets
pub async fn handle_news_facets(State(state): State<AppState>) -> Json<FacetsResponse> {
    let snapshot = state.records.refresh_if_stale().await;
    let today = today_in(state.config.reference_tz);
    Json(FacetsResponse {
        source: snapshot.status.clone(),
        facets: facets(&snapshot.records, today),
    })
}

/// POST /api/v1/news/refresh
///
/// The reload runs on its own task so a client hanging up does not cancel it
/// half way.
pub async fn handle_refresh(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let records = Arc::clone(&state.records);
    let snapshot = tokio::spawn(async move { records.refresh().await })
        .await
        .context("news refresh task failed")?;
    match &snapshot.status {
        SourceStatus::Available => Ok(Json(RefreshResponse {
            records: snapshot.records.len(),
        })),
        SourceStatus::Unavailable { reason } => Err(AppError::SourceUnavailable(reason.clone())),
    }
}
