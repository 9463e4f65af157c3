//! Baseball Savant (Statcast) search client
//!
//! Pulls pitch-level rows for a date range from the Statcast CSV search
//! endpoint. Savant truncates large responses, so the range is requested in
//! small day chunks. Chunks can be cached on disk through an explicit
//! [`FetchCache`] handed to the client.

use crate::error::Result;
use chrono::{Datelike, Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One pitch row. Only the columns the pipeline reads are kept; every field
/// stays text so numeric coercion happens in one place.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPitch {
    #[serde(default)]
    pub game_date: Option<String>,
    /// Set only on the final pitch of a plate appearance
    #[serde(default)]
    pub events: Option<String>,
    /// Present in pre-labeled exports only
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub balls: Option<String>,
    #[serde(default)]
    pub strikes: Option<String>,
    #[serde(default)]
    pub stand: Option<String>,
    #[serde(default)]
    pub p_throws: Option<String>,
    #[serde(default)]
    pub inning: Option<String>,
    #[serde(default)]
    pub outs_when_up: Option<String>,
}

/// Parsed CSV: header names plus rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPitchTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawPitch>,
}

impl RawPitchTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append another chunk, keeping the first non-empty header
    pub fn extend(&mut self, other: RawPitchTable) {
        if self.columns.is_empty() {
            self.columns = other.columns;
        }
        self.rows.extend(other.rows);
    }
}

/// Parse Statcast-format CSV text
pub fn parse_statcast_csv<R: Read>(reader: R) -> Result<RawPitchTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        let row: RawPitch = record?;
        rows.push(row);
    }

    Ok(RawPitchTable { columns, rows })
}

/// On-disk cache of raw CSV chunks, keyed by chunk date range
#[derive(Debug, Clone)]
pub struct FetchCache {
    dir: PathBuf,
}

impl FetchCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, start: NaiveDate, end: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "statcast_{}_{}.csv",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ))
    }

    pub async fn read(&self, start: NaiveDate, end: NaiveDate) -> Result<Option<String>> {
        let path = self.path_for(start, end);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(tokio::fs::read_to_string(&path).await?))
    }

    pub async fn write(&self, start: NaiveDate, end: NaiveDate, body: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(start, end), body).await?;
        Ok(())
    }
}

/// Split an inclusive date range into inclusive chunks of at most `chunk_days`
pub fn date_chunks(start: NaiveDate, end: NaiveDate, chunk_days: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let step = i64::from(chunk_days.max(1));
    let mut chunks = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let chunk_end = (cursor + Duration::days(step - 1)).min(end);
        chunks.push((cursor, chunk_end));
        cursor = chunk_end + Duration::days(1);
    }
    chunks
}

/// December and January have no MLB games of any type
fn is_offseason(date: NaiveDate) -> bool {
    matches!(date.month(), 12 | 1)
}

/// Statcast search client
#[derive(Clone)]
pub struct StatcastClient {
    http: Client,
    base_url: String,
    chunk_days: u32,
    skip_offseason: bool,
    cache: Option<FetchCache>,
}

impl StatcastClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            chunk_days: 5,
            skip_offseason: true,
            cache: None,
        })
    }

    pub fn with_cache(mut self, cache: FetchCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_chunk_days(mut self, chunk_days: u32) -> Self {
        self.chunk_days = chunk_days.max(1);
        self
    }

    pub fn with_skip_offseason(mut self, skip: bool) -> Self {
        self.skip_offseason = skip;
        self
    }

    /// Fetch every pitch in `[start, end]`, chunk by chunk
    pub async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> Result<RawPitchTable> {
        let mut table = RawPitchTable::default();

        for (chunk_start, chunk_end) in date_chunks(start, end, self.chunk_days) {
            if self.skip_offseason && is_offseason(chunk_start) && is_offseason(chunk_end) {
                debug!("Skipping offseason chunk {} to {}", chunk_start, chunk_end);
                continue;
            }

            let body = self.fetch_chunk(chunk_start, chunk_end).await?;
            let chunk = parse_statcast_csv(body.as_bytes())?;
            info!(
                "Statcast {} to {}: {} pitches",
                chunk_start,
                chunk_end,
                chunk.rows.len()
            );
            table.extend(chunk);
        }

        Ok(table)
    }

    async fn fetch_chunk(&self, start: NaiveDate, end: NaiveDate) -> Result<String> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.read(start, end).await? {
                debug!("Cache hit for {} to {}", start, end);
                return Ok(body);
            }
        }

        let url = format!("{}/statcast_search/csv", self.base_url);
        let start_s = start.format("%Y-%m-%d").to_string();
        let end_s = end.format("%Y-%m-%d").to_string();
        let body = self
            .http
            .get(&url)
            .query(&[
                ("all", "true"),
                ("hfGT", "R|PO|S|"),
                ("player_type", "pitcher"),
                ("game_date_gt", start_s.as_str()),
                ("game_date_lt", end_s.as_str()),
                ("min_pitches", "0"),
                ("min_results", "0"),
                ("group_by", "name"),
                ("sort_col", "pitches"),
                ("sort_order", "desc"),
                ("type", "details"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if let Some(cache) = &self.cache {
            cache.write(start, end, &body).await?;
        }

        Ok(body)
    }
}
