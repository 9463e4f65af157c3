//! Configuration loading
//!
//! Every field has a default, so a missing config file yields a working setup
//! that fetches the default season window and writes artifacts to the
//! working directory.

use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub statcast: StatcastConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

/// Statcast search endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatcastConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,
    #[serde(default = "default_end_date")]
    pub end_date: NaiveDate,
    /// Days per request; Savant truncates large responses
    #[serde(default = "default_chunk_days")]
    pub chunk_days: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Skip December and January chunks (no MLB games)
    #[serde(default = "default_true")]
    pub skip_offseason: bool,
}

/// On-disk cache for fetched raw CSV chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

/// Trainer and booster hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_subsample")]
    pub subsample: f64,
    #[serde(default = "default_colsample")]
    pub colsample_bytree: f64,
    #[serde(default = "default_early_stopping")]
    pub early_stopping_rounds: usize,
    /// L2 regularization on leaf weights
    #[serde(default = "default_reg_lambda")]
    pub reg_lambda: f64,
    /// Minimum hessian sum per child
    #[serde(default = "default_min_child_weight")]
    pub min_child_weight: f64,
    /// Minimum PAs before a matchup-specific model is trained
    #[serde(default = "default_min_platoon_pas")]
    pub min_platoon_pas: usize,
    #[serde(default = "default_true")]
    pub train_platoon_models: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_artifacts_dir")]
    pub dir: String,
}

fn default_base_url() -> String {
    "https://baseballsavant.mlb.com".to_string()
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 30).unwrap_or_default()
}

fn default_chunk_days() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> String {
    ".statcast_cache".to_string()
}

fn default_holdout_fraction() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_n_estimators() -> usize {
    400
}

fn default_max_depth() -> usize {
    8
}

fn default_learning_rate() -> f64 {
    0.05
}

fn default_subsample() -> f64 {
    0.8
}

fn default_colsample() -> f64 {
    0.8
}

fn default_early_stopping() -> usize {
    25
}

fn default_reg_lambda() -> f64 {
    1.0
}

fn default_min_child_weight() -> f64 {
    1.0
}

fn default_min_platoon_pas() -> usize {
    1000
}

fn default_artifacts_dir() -> String {
    ".".to_string()
}

impl Default for StatcastConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            chunk_days: default_chunk_days(),
            timeout_secs: default_timeout_secs(),
            skip_offseason: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            holdout_fraction: default_holdout_fraction(),
            seed: default_seed(),
            n_estimators: default_n_estimators(),
            max_depth: default_max_depth(),
            learning_rate: default_learning_rate(),
            subsample: default_subsample(),
            colsample_bytree: default_colsample(),
            early_stopping_rounds: default_early_stopping(),
            reg_lambda: default_reg_lambda(),
            min_child_weight: default_min_child_weight(),
            min_platoon_pas: default_min_platoon_pas(),
            train_platoon_models: true,
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: default_artifacts_dir(),
        }
    }
}

impl CacheConfig {
    /// Expanded cache directory, or `None` when caching is off
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.enabled.then(|| expand_path(&self.dir))
    }
}

impl ArtifactsConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        expand_path(&self.dir)
    }
}

impl Config {
    /// Load configuration from a TOML file; a missing file yields defaults
    pub fn load(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path).required(false))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Expand a leading `~` in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
