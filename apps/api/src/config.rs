use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;

use crate::news::models::ColumnSchema;

const CSV_URL_TEMPLATE: &str =
    "https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv&gid={gid}";
const DEFAULT_SHEET_ID: &str = "1_HwpbhcZJHqgK0rkl6aRlYOKGGNpL2MAhZ5TDorxJmg";

/// Application configuration loaded from environment variables.
/// Every value has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub sheet_csv_url: String,
    pub refresh_ttl: Duration,
    pub fetch_timeout: Duration,
    pub reference_tz: Tz,
    pub columns: ColumnSchema,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let sheet_csv_url = match std::env::var("SHEET_CSV_URL") {
            Ok(url) => url,
            Err(_) => sheet_export_url(
                &env_or("SHEET_ID", DEFAULT_SHEET_ID),
                &env_or("SHEET_GID", "0"),
            ),
        };

        let defaults = ColumnSchema::default();
        let columns = ColumnSchema {
            published_at: env_or("COLUMN_PUBLISHED_AT", &defaults.published_at),
            title: env_or("COLUMN_TITLE", &defaults.title),
            body: env_or("COLUMN_BODY", &defaults.body),
            topic: env_or("COLUMN_TOPIC", &defaults.topic),
            summary: env_or("COLUMN_SUMMARY", &defaults.summary),
            newsletter: env_or("COLUMN_NEWSLETTER", &defaults.newsletter),
        };

        Ok(Config {
            sheet_csv_url,
            refresh_ttl: Duration::from_secs(parse_env("REFRESH_TTL_SECS", 300)?),
            fetch_timeout: Duration::from_secs(parse_env("FETCH_TIMEOUT_SECS", 15)?),
            reference_tz: parse_tz(&env_or("REFERENCE_TZ", "Asia/Seoul"))?,
            columns,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

pub fn sheet_export_url(sheet_id: &str, gid: &str) -> String {
    CSV_URL_TEMPLATE
        .replace("{sheet_id}", sheet_id)
        .replace("{gid}", gid)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_tz(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow!("REFERENCE_TZ '{name}' is not a known IANA zone: {e}"))
}
