//! Sheet client: fetches the published CSV export of the news sheet.
//!
//! Every failure mode collapses into `SourceError`, which callers treat as
//! "source unavailable". The request is bounded by the configured timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source did not respond within {0:?}")]
    Timeout(Duration),

    #[error("source returned status {status}")]
    Status { status: u16 },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Where raw tabular text comes from. `SheetClient` in production; tests
/// substitute canned CSV.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_csv(&self) -> Result<String, SourceError>;
}

#[derive(Clone)]
pub struct SheetClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl SheetClient {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            url,
            timeout,
        }
    }
}

#[async_trait]
impl RecordSource for SheetClient {
    async fn fetch_csv(&self) -> Result<String, SourceError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout)
            } else {
                SourceError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/html"))
            .unwrap_or(false);

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout)
            } else {
                SourceError::Http(e)
            }
        })?;

        debug!("Fetched {} bytes from sheet export", bytes.len());
        decode_body(&bytes, is_html)
    }
}

/// Validates the export body: UTF-8, non-empty and not an HTML page.
/// Private sheets answer with a sign-in page instead of CSV.
fn decode_body(bytes: &[u8], is_html: bool) -> Result<String, SourceError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SourceError::Malformed(format!("body is not UTF-8: {e}")))?;

    if text.trim().is_empty() {
        return Err(SourceError::Malformed("empty body".to_string()));
    }

    let head: String = text
        .trim_start()
        .chars()
        .take(14)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if is_html || head.starts_with("<!doctype html") || head.starts_with("<html") {
        return Err(SourceError::Malformed(
            "received an HTML page instead of CSV; check the sheet's sharing settings"
                .to_string(),
        ));
    }

    Ok(text.to_string())
}
