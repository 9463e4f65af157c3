//! Outcome classifier training
//!
//! Builds features, encodes labels, makes a seeded stratified holdout split,
//! fits the booster with early stopping on the holdout and reports holdout
//! accuracy. The fitted model travels together with its label encoder and
//! the feature column order it was trained on.

use super::booster::{BoosterParams, GradientBoostedClassifier};
use super::features::{build_features, PaContext};
use crate::config::TrainingConfig;
use crate::error::{ModelError, Result};
use crate::ingester::PaDataset;
use crate::types::{Outcome, OutcomeProbs};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Maps outcome categories to dense class indices.
///
/// Classes are the categories present at fit time, sorted by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<Outcome>,
}

impl LabelEncoder {
    pub fn fit(labels: &[Outcome]) -> Self {
        let mut classes: Vec<Outcome> = Vec::new();
        for label in labels {
            if !classes.contains(label) {
                classes.push(*label);
            }
        }
        classes.sort_by_key(|o| o.name());
        Self { classes }
    }

    pub fn transform(&self, outcome: Outcome) -> Option<usize> {
        self.classes.iter().position(|c| *c == outcome)
    }

    pub fn inverse_transform(&self, index: usize) -> Option<Outcome> {
        self.classes.get(index).copied()
    }

    pub fn classes(&self) -> &[Outcome] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Training summary stored with the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Holdout accuracy
    pub accuracy: f64,
    /// Class names in encoded order
    pub classes: Vec<String>,
    /// Feature columns in training order; authoritative for inference
    pub feature_names: Vec<String>,
}

/// Fitted classifier bundle: model, label encoder and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeModel {
    #[serde(rename = "model")]
    pub classifier: GradientBoostedClassifier,
    pub label_encoder: LabelEncoder,
    pub meta: ModelMeta,
}

impl OutcomeModel {
    /// Probability for all eight categories in the given context. Categories
    /// the model never saw get 0.0.
    pub fn outcome_probs(&self, context: &PaContext) -> Result<OutcomeProbs> {
        let row = context.to_features(&self.meta.feature_names)?;
        let class_probs = self.classifier.predict_proba(&row)?;

        let mut probs = OutcomeProbs::zeros();
        for (index, p) in class_probs.into_iter().enumerate() {
            let outcome = self.label_encoder.inverse_transform(index).ok_or_else(|| {
                ModelError::InvalidArtifact(format!("class index {} has no label", index))
            })?;
            probs.set(outcome, p);
        }
        Ok(probs)
    }
}

/// Seeded stratified split into (train, holdout) row indices.
///
/// Each class contributes `round(n * holdout_fraction)` of its rows to the
/// holdout. Both index lists come back sorted.
pub fn stratified_split(
    labels: &[usize],
    n_classes: usize,
    holdout_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut holdout = Vec::new();

    for class in 0..n_classes {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n_holdout = ((members.len() as f64 * holdout_fraction).round() as usize).min(members.len());
        holdout.extend_from_slice(&members[..n_holdout]);
        train.extend_from_slice(&members[n_holdout..]);
    }

    train.sort_unstable();
    holdout.sort_unstable();
    (train, holdout)
}

/// Train the outcome classifier on a labeled dataset
pub fn train_model(dataset: &PaDataset, config: &TrainingConfig) -> Result<OutcomeModel> {
    if !(config.holdout_fraction > 0.0 && config.holdout_fraction < 1.0) {
        return Err(ModelError::InvalidInput(format!(
            "holdout_fraction must be in (0, 1), got {}",
            config.holdout_fraction
        )));
    }

    let features = build_features(dataset);
    if features.is_empty() {
        return Err(ModelError::NoData(
            "no valid rows after building features; check PA data and outcome mapping".into(),
        ));
    }

    let encoder = LabelEncoder::fit(&features.labels);
    let y: Vec<usize> = features
        .labels
        .iter()
        .filter_map(|o| encoder.transform(*o))
        .collect();

    let (train_idx, holdout_idx) =
        stratified_split(&y, encoder.len(), config.holdout_fraction, config.seed);
    if train_idx.is_empty() || holdout_idx.is_empty() {
        return Err(ModelError::NoData(format!(
            "{} rows are too few for a train/holdout split",
            features.len()
        )));
    }

    let pick_x = |idx: &[usize]| -> Vec<Vec<f64>> {
        idx.iter().map(|&i| features.rows[i].clone()).collect()
    };
    let pick_y = |idx: &[usize]| -> Vec<usize> { idx.iter().map(|&i| y[i]).collect() };
    let (x_train, y_train) = (pick_x(&train_idx), pick_y(&train_idx));
    let (x_test, y_test) = (pick_x(&holdout_idx), pick_y(&holdout_idx));

    info!(
        "Training on {} rows, holding out {} ({} classes, features {:?})",
        x_train.len(),
        x_test.len(),
        encoder.len(),
        features.feature_names
    );

    let classifier = GradientBoostedClassifier::fit(
        BoosterParams::from(config),
        &x_train,
        &y_train,
        encoder.len(),
        Some((x_test.as_slice(), y_test.as_slice())),
    )?;

    let mut correct = 0usize;
    for (row, &label) in x_test.iter().zip(&y_test) {
        if classifier.predict(row)? == label {
            correct += 1;
        }
    }
    let accuracy = correct as f64 / x_test.len() as f64;
    info!(
        "Kept {} boosting rounds (best round {}), holdout accuracy {:.4}",
        classifier.n_rounds(),
        classifier.best_iteration(),
        accuracy
    );

    let meta = ModelMeta {
        accuracy,
        classes: encoder.classes().iter().map(|c| c.name().to_string()).collect(),
        feature_names: features.feature_names.clone(),
    };

    Ok(OutcomeModel {
        classifier,
        label_encoder: encoder,
        meta,
    })
}
