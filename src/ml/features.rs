//! Feature engineering for plate appearance outcomes
//!
//! Feature columns, in order:
//! - `count_id`: balls * 4 + strikes (0-0 is 0, 3-2 is 14)
//! - `platoon_same`: 1 when batter and pitcher share a hand
//! - `inning`, `outs_when_up`: only when the source carried those columns
//!
//! The column order produced here is recorded with every trained model and
//! is the order used at inference time.

use crate::error::{ModelError, Result};
use crate::ingester::PaDataset;
use crate::types::{Outcome, PlatoonMatchup};

pub const COUNT_ID: &str = "count_id";
pub const PLATOON_SAME: &str = "platoon_same";
pub const INNING: &str = "inning";
pub const OUTS_WHEN_UP: &str = "outs_when_up";

/// Inning assumed when a query does not supply one
pub const DEFAULT_INNING: f64 = 5.0;
/// Outs assumed when a query does not supply them
pub const DEFAULT_OUTS: f64 = 0.0;

/// Combined ball-strike count state. Widened so malformed source counts
/// cannot overflow.
pub fn count_id(balls: u32, strikes: u32) -> u64 {
    u64::from(balls) * 4 + u64::from(strikes)
}

/// Numeric features and labels, one row per usable plate appearance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<Outcome>,
}

impl FeatureMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Feature column names for a dataset
pub fn feature_names(dataset: &PaDataset) -> Vec<String> {
    let mut names = vec![COUNT_ID.to_string(), PLATOON_SAME.to_string()];
    if dataset.has_inning {
        names.push(INNING.to_string());
    }
    if dataset.has_outs_when_up {
        names.push(OUTS_WHEN_UP.to_string());
    }
    names
}

/// Build the feature matrix. Rows without a known outcome label are dropped;
/// missing inning/outs values are filled with zero.
pub fn build_features(dataset: &PaDataset) -> FeatureMatrix {
    let names = feature_names(dataset);
    let mut rows = Vec::with_capacity(dataset.len());
    let mut labels = Vec::with_capacity(dataset.len());

    for pa in &dataset.records {
        let Some(outcome) = pa.outcome else {
            continue;
        };

        let platoon_same = pa.platoon_matchup() == Some(PlatoonMatchup::Same);
        let mut row = vec![
            count_id(pa.balls, pa.strikes) as f64,
            if platoon_same { 1.0 } else { 0.0 },
        ];
        if dataset.has_inning {
            row.push(pa.inning.unwrap_or(0.0));
        }
        if dataset.has_outs_when_up {
            row.push(pa.outs_when_up.unwrap_or(0.0));
        }

        rows.push(row);
        labels.push(outcome);
    }

    FeatureMatrix {
        feature_names: names,
        rows,
        labels,
    }
}

/// Situational context for a single probability query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaContext {
    pub balls: u32,
    pub strikes: u32,
    pub same_hand: bool,
    pub inning: Option<f64>,
    pub outs: Option<f64>,
}

impl PaContext {
    pub fn new(balls: u32, strikes: u32, same_hand: bool) -> Self {
        Self {
            balls,
            strikes,
            same_hand,
            inning: None,
            outs: None,
        }
    }

    pub fn with_inning(mut self, inning: f64) -> Self {
        self.inning = Some(inning);
        self
    }

    pub fn with_outs(mut self, outs: f64) -> Self {
        self.outs = Some(outs);
        self
    }

    pub fn count_id(&self) -> u64 {
        count_id(self.balls, self.strikes)
    }

    pub fn matchup(&self) -> PlatoonMatchup {
        PlatoonMatchup::from_same_hand(self.same_hand)
    }

    /// Reject counts that cannot occur mid plate appearance
    pub fn validate(&self) -> Result<()> {
        if self.balls > 3 || self.strikes > 2 {
            return Err(ModelError::InvalidInput(format!(
                "invalid count {}-{}",
                self.balls, self.strikes
            )));
        }
        Ok(())
    }

    /// Feature vector laid out in `feature_names` order
    pub fn to_features(&self, feature_names: &[String]) -> Result<Vec<f64>> {
        feature_names
            .iter()
            .map(|name| match name.as_str() {
                COUNT_ID => Ok(self.count_id() as f64),
                PLATOON_SAME => Ok(if self.same_hand { 1.0 } else { 0.0 }),
                INNING => Ok(self.inning.unwrap_or(DEFAULT_INNING)),
                OUTS_WHEN_UP => Ok(self.outs.unwrap_or(DEFAULT_OUTS)),
                other => Err(ModelError::InvalidArtifact(format!(
                    "unknown feature column: {}",
                    other
                ))),
            })
            .collect()
    }
}
