//! Plate appearance dataset loading
//!
//! Turns pitch-level rows into one labeled record per completed plate
//! appearance. Only the final pitch of a PA carries `events`, so filtering on
//! that column yields exactly one row per PA.

pub mod classifier;

#[cfg(test)]
mod tests;

pub use classifier::{classify_event, EventPattern, EventRule, EVENT_RULES};

use crate::client::{parse_statcast_csv, RawPitch, RawPitchTable, StatcastClient};
use crate::error::{ModelError, Result};
use crate::types::{Outcome, PlateAppearance, PlatoonMatchup};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::info;

/// Source of raw pitch rows for a date range
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PitchSource: Send + Sync {
    async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<RawPitchTable>;
}

#[async_trait]
impl PitchSource for StatcastClient {
    async fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<RawPitchTable> {
        self.fetch_range(start, end).await
    }
}

/// A local Statcast-format CSV export. The file is taken as-is; the requested
/// date range is not applied.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PitchSource for CsvFileSource {
    async fn fetch(&self, _start: NaiveDate, _end: NaiveDate) -> Result<RawPitchTable> {
        if !self.path.exists() {
            return Err(ModelError::ArtifactNotFound(self.path.clone()));
        }
        let body = tokio::fs::read(&self.path).await?;
        parse_statcast_csv(body.as_slice())
    }
}

/// Labeled plate appearances plus which optional context columns the source had
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaDataset {
    pub records: Vec<PlateAppearance>,
    pub has_inning: bool,
    pub has_outs_when_up: bool,
}

impl PaDataset {
    pub fn new(records: Vec<PlateAppearance>) -> Self {
        let has_inning = records.iter().any(|r| r.inning.is_some());
        let has_outs_when_up = records.iter().any(|r| r.outs_when_up.is_some());
        Self {
            records,
            has_inning,
            has_outs_when_up,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows with a known batter/pitcher matchup equal to `matchup`
    pub fn filter_matchup(&self, matchup: PlatoonMatchup) -> PaDataset {
        PaDataset {
            records: self
                .records
                .iter()
                .filter(|r| r.platoon_matchup() == Some(matchup))
                .cloned()
                .collect(),
            has_inning: self.has_inning,
            has_outs_when_up: self.has_outs_when_up,
        }
    }

    /// PA count per matchup, same first
    pub fn platoon_counts(&self) -> Vec<(PlatoonMatchup, usize)> {
        PlatoonMatchup::ALL
            .iter()
            .map(|m| {
                let n = self
                    .records
                    .iter()
                    .filter(|r| r.platoon_matchup() == Some(*m))
                    .count();
                (*m, n)
            })
            .collect()
    }

    /// Build PA records from raw pitch rows.
    ///
    /// A table with an `outcome` column is treated as pre-labeled: the label
    /// is parsed as a category name and left empty when it is not one.
    pub fn from_raw(table: RawPitchTable) -> Self {
        let prelabeled = table.has_column("outcome");
        let has_inning = table.has_column("inning");
        let has_outs_when_up = table.has_column("outs_when_up");

        let records = table
            .rows
            .into_iter()
            .filter(|row| is_final_pitch(row, prelabeled))
            .map(|row| to_plate_appearance(row, prelabeled))
            .collect();

        Self {
            records,
            has_inning,
            has_outs_when_up,
        }
    }
}

fn is_populated(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn is_final_pitch(row: &RawPitch, prelabeled: bool) -> bool {
    is_populated(&row.events) || (prelabeled && is_populated(&row.outcome))
}

fn to_plate_appearance(row: RawPitch, prelabeled: bool) -> PlateAppearance {
    let outcome = if prelabeled {
        row.outcome
            .as_deref()
            .and_then(|s| s.trim().parse::<Outcome>().ok())
    } else {
        Some(classify_event(row.events.as_deref()))
    };

    PlateAppearance {
        game_date: row
            .game_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
        outcome,
        balls: coerce_count(row.balls.as_deref()),
        strikes: coerce_count(row.strikes.as_deref()),
        stand: row.stand,
        p_throws: row.p_throws,
        inning: row.inning.as_deref().map(coerce_numeric),
        outs_when_up: row.outs_when_up.as_deref().map(coerce_numeric),
        events: row.events,
    }
}

/// Non-negative integer count; anything unparseable, negative or non-finite is 0
pub fn coerce_count(value: Option<&str>) -> u32 {
    let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return 0;
    };
    if let Ok(n) = v.parse::<u32>() {
        return n;
    }
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => f.trunc() as u32,
        _ => 0,
    }
}

/// Numeric context value; anything unparseable or non-finite is 0.0
pub fn coerce_numeric(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

/// Fetch `[start, end]` from `source` and reduce it to labeled plate appearances.
///
/// An empty fetch yields an empty dataset rather than an error.
pub async fn load_pa_dataset(
    source: &dyn PitchSource,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PaDataset> {
    if start > end {
        return Err(ModelError::InvalidInput(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }

    let table = source.fetch(start, end).await?;
    if table.is_empty() {
        info!("No pitch rows returned for {} to {}", start, end);
        return Ok(PaDataset::default());
    }

    let pitches = table.rows.len();
    let dataset = PaDataset::from_raw(table);
    info!(
        "Reduced {} pitches to {} plate appearances",
        pitches,
        dataset.len()
    );
    Ok(dataset)
}
