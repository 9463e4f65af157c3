//! Artifact persistence
//!
//! Flat JSON files under one directory:
//! - `pa_outcome_rates.json`: overall league rates
//! - `pa_outcome_rates_{same,opposite}.json`: rates per platoon matchup
//! - `pa_outcome_model.json`: classifier, label encoder and metadata
//! - `pa_outcome_model_{same,opposite}.json`: per-matchup classifiers


use crate::error::{ModelError, Result};
use crate::ml::OutcomeModel;
use crate::types::{OutcomeProbs, PlatoonMatchup};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const RATES_FILE: &str = "pa_outcome_rates.json";
pub const MODEL_FILE: &str = "pa_outcome_model.json";

/// Reads and writes rate tables and model bundles in one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn rates_path(&self) -> PathBuf {
        self.dir.join(RATES_FILE)
    }

    pub fn platoon_rates_path(&self, matchup: PlatoonMatchup) -> PathBuf {
        self.dir.join(format!("pa_outcome_rates_{}.json", matchup.as_str()))
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn platoon_model_path(&self, matchup: PlatoonMatchup) -> PathBuf {
        self.dir.join(format!("pa_outcome_model_{}.json", matchup.as_str()))
    }

    pub fn has_model(&self) -> bool {
        self.model_path().exists()
    }

    pub fn has_platoon_model(&self, matchup: PlatoonMatchup) -> bool {
        self.platoon_model_path(matchup).exists()
    }

    pub fn write_rates(&self, rates: &OutcomeProbs) -> Result<PathBuf> {
        let path = self.rates_path();
        write_json(&path, rates)?;
        Ok(path)
    }

    pub fn write_platoon_rates(&self, matchup: PlatoonMatchup, rates: &OutcomeProbs) -> Result<PathBuf> {
        let path = self.platoon_rates_path(matchup);
        write_json(&path, rates)?;
        Ok(path)
    }

    pub fn load_rates(&self) -> Result<OutcomeProbs> {
        read_json(&self.rates_path())
    }

    pub fn load_platoon_rates(&self, matchup: PlatoonMatchup) -> Result<OutcomeProbs> {
        read_json(&self.platoon_rates_path(matchup))
    }

    pub fn save_model(&self, model: &OutcomeModel) -> Result<PathBuf> {
        let path = self.model_path();
        write_json(&path, model)?;
        Ok(path)
    }

    pub fn save_platoon_model(&self, matchup: PlatoonMatchup, model: &OutcomeModel) -> Result<PathBuf> {
        let path = self.platoon_model_path(matchup);
        write_json(&path, model)?;
        Ok(path)
    }

    pub fn load_model(&self) -> Result<OutcomeModel> {
        load_model_file(&self.model_path())
    }

    pub fn load_platoon_model(&self, matchup: PlatoonMatchup) -> Result<OutcomeModel> {
        load_model_file(&self.platoon_model_path(matchup))
    }
}

fn load_model_file(path: &Path) -> Result<OutcomeModel> {
    let model: OutcomeModel = read_json(path)?;
    if model.meta.feature_names.len() != model.classifier.n_features() {
        return Err(ModelError::InvalidArtifact(format!(
            "{}: {} feature names for a {}-feature model",
            path.display(),
            model.meta.feature_names.len(),
            model.classifier.n_features()
        )));
    }
    if model.label_encoder.len() != model.classifier.n_classes() {
        return Err(ModelError::InvalidArtifact(format!(
            "{}: label encoder does not match model classes",
            path.display()
        )));
    }
    Ok(model)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(ModelError::ArtifactNotFound(path.to_path_buf()));
    }
    let body = std::fs::read_to_string(path)?;
    serde_json::from_str(&body)
        .map_err(|e| ModelError::InvalidArtifact(format!("{}: {}", path.display(), e)))
}
