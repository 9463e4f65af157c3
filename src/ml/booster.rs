//! Multiclass gradient-boosted decision trees
//!
//! Softmax objective with second-order (gradient + hessian) regression trees,
//! one tree per class per boosting round:
//!
//! 1. Start every margin at zero
//! 2. Each round, turn margins into class probabilities with softmax
//! 3. For each class fit a depth-limited tree to `g = p - y`, `h = 2p(1 - p)`
//!    with leaf weight `-G / (H + lambda)` scaled by the learning rate
//! 4. Stop early once holdout multiclass log-loss has not improved for
//!    `early_stopping_rounds` rounds and keep the best round's ensemble
//!
//! Identical (feature row, label) pairs are collapsed into weighted samples
//! before fitting. Row subsampling thins those weights row by row, so the
//! result matches fitting on the expanded data.

use crate::config::TrainingConfig;
use crate::error::{ModelError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

const MIN_HESSIAN: f64 = 1e-16;
const PROB_EPS: f64 = 1e-15;

/// Booster hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub early_stopping_rounds: usize,
    pub reg_lambda: f64,
    pub min_child_weight: f64,
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self::from(&TrainingConfig::default())
    }
}

impl From<&TrainingConfig> for BoosterParams {
    fn from(config: &TrainingConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_depth: config.max_depth,
            learning_rate: config.learning_rate,
            subsample: config.subsample,
            colsample_bytree: config.colsample_bytree,
            early_stopping_rounds: config.early_stopping_rounds,
            reg_lambda: config.reg_lambda,
            min_child_weight: config.min_child_weight,
            seed: config.seed,
        }
    }
}

impl BoosterParams {
    fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ModelError::Training("n_estimators must be positive".into()));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(ModelError::Training("learning_rate must be positive".into()));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(ModelError::Training("subsample must be in (0, 1]".into()));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return Err(ModelError::Training("colsample_bytree must be in (0, 1]".into()));
        }
        if self.reg_lambda < 0.0 || self.min_child_weight < 0.0 {
            return Err(ModelError::Training("regularization must be non-negative".into()));
        }
        Ok(())
    }
}

/// Tree node; splits send `x[feature] < threshold` left
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a node arena rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if x < *threshold { *left } else { *right };
                }
                Some(TreeNode::Leaf { value }) => return *value,
                None => return 0.0,
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn depth_of(nodes: &[TreeNode], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + depth_of(nodes, *left).max(depth_of(nodes, *right))
                }
                _ => 0,
            }
        }
        depth_of(&self.nodes, 0)
    }
}

/// Fitted multiclass booster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    params: BoosterParams,
    n_classes: usize,
    n_features: usize,
    /// `rounds[r][k]` is the class-`k` tree of round `r`
    rounds: Vec<Vec<RegressionTree>>,
    best_iteration: usize,
    best_score: Option<f64>,
}

/// Collapsed training rows: unique (features, label) with multiplicity
struct WeightedSamples {
    rows: Vec<Vec<f64>>,
    labels: Vec<usize>,
    counts: Vec<u32>,
}

impl WeightedSamples {
    fn collapse(x: &[Vec<f64>], y: &[usize]) -> Self {
        let mut groups: BTreeMap<(Vec<u64>, usize), usize> = BTreeMap::new();
        let mut samples = WeightedSamples {
            rows: Vec::new(),
            labels: Vec::new(),
            counts: Vec::new(),
        };

        for (row, &label) in x.iter().zip(y) {
            let key = (row.iter().map(|v| v.to_bits()).collect::<Vec<_>>(), label);
            match groups.get(&key) {
                Some(&i) => samples.counts[i] += 1,
                None => {
                    groups.insert(key, samples.rows.len());
                    samples.rows.push(row.clone());
                    samples.labels.push(label);
                    samples.counts.push(1);
                }
            }
        }
        samples
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Per-feature sorted distinct values and each sample's bin index
struct BinnedFeatures {
    values: Vec<Vec<f64>>,
    bins: Vec<Vec<usize>>,
}

impl BinnedFeatures {
    fn new(rows: &[Vec<f64>], n_features: usize) -> Self {
        let mut values = Vec::with_capacity(n_features);
        let mut bins = Vec::with_capacity(n_features);

        for f in 0..n_features {
            let mut distinct: Vec<f64> = rows.iter().map(|r| r[f]).collect();
            distinct.sort_by(|a, b| a.total_cmp(b));
            distinct.dedup();
            let feature_bins = rows
                .iter()
                .map(|r| distinct.partition_point(|v| *v < r[f]))
                .collect();
            values.push(distinct);
            bins.push(feature_bins);
        }

        Self { values, bins }
    }
}

struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

/// Grows one tree from gradient statistics
struct TreeBuilder<'a> {
    binned: &'a BinnedFeatures,
    grad: &'a [f64],
    hess: &'a [f64],
    features: &'a [usize],
    params: &'a BoosterParams,
    nodes: Vec<TreeNode>,
}

impl TreeBuilder<'_> {
    fn build(mut self, samples: Vec<usize>) -> RegressionTree {
        self.grow(samples, 0);
        RegressionTree { nodes: self.nodes }
    }

    fn leaf_value(&self, g: f64, h: f64) -> f64 {
        -g / (h + self.params.reg_lambda) * self.params.learning_rate
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.reg_lambda)
    }

    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let g: f64 = samples.iter().map(|&i| self.grad[i]).sum();
        let h: f64 = samples.iter().map(|&i| self.hess[i]).sum();
        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            value: self.leaf_value(g, h),
        });

        if depth >= self.params.max_depth || samples.len() < 2 {
            return idx;
        }

        let Some(split) = self.best_split(&samples, g, h) else {
            return idx;
        };

        let feature_bins = &self.binned.bins[split.feature];
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| feature_bins[i] <= split.bin);

        let values = &self.binned.values[split.feature];
        let threshold = (values[split.bin] + values[split.bin + 1]) / 2.0;

        let left_idx = self.grow(left, depth + 1);
        let right_idx = self.grow(right, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            threshold,
            left: left_idx,
            right: right_idx,
        };
        idx
    }

    fn best_split(&self, samples: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let parent = self.score(g, h);
        let mut best: Option<SplitCandidate> = None;

        for &f in self.features {
            let n_bins = self.binned.values[f].len();
            if n_bins < 2 {
                continue;
            }

            let mut hist_g = vec![0.0; n_bins];
            let mut hist_h = vec![0.0; n_bins];
            for &i in samples {
                let b = self.binned.bins[f][i];
                hist_g[b] += self.grad[i];
                hist_h[b] += self.hess[i];
            }

            let mut gl = 0.0;
            let mut hl = 0.0;
            for b in 0..n_bins - 1 {
                gl += hist_g[b];
                hl += hist_h[b];
                let gr = g - gl;
                let hr = h - hl;
                if hl < self.params.min_child_weight || hr < self.params.min_child_weight {
                    continue;
                }
                // Empty bins on either side would duplicate an earlier cut
                if hist_h[b] == 0.0 && hist_g[b] == 0.0 {
                    continue;
                }
                let gain = 0.5 * (self.score(gl, hl) + self.score(gr, hr) - parent);
                if gain > 1e-12 && best.as_ref().map_or(true, |s| gain > s.gain) {
                    best = Some(SplitCandidate {
                        feature: f,
                        bin: b,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn softmax_into(margins: &[f64], out: &mut [f64]) {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for (o, m) in out.iter_mut().zip(margins) {
        *o = (m - max).exp();
        sum += *o;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
}

/// Weighted mean multiclass log-loss
fn mlogloss(margins: &[Vec<f64>], labels: &[usize], counts: &[u32], n_classes: usize) -> f64 {
    let mut probs = vec![0.0; n_classes];
    let mut total = 0.0;
    let mut weight = 0.0;
    for ((m, &y), &c) in margins.iter().zip(labels).zip(counts) {
        softmax_into(m, &mut probs);
        total -= f64::from(c) * probs[y].clamp(PROB_EPS, 1.0).ln();
        weight += f64::from(c);
    }
    if weight > 0.0 {
        total / weight
    } else {
        0.0
    }
}

impl GradientBoostedClassifier {
    /// Fit on `x` / `y` (class indices below `n_classes`), optionally early
    /// stopping against an evaluation set.
    pub fn fit(
        params: BoosterParams,
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        eval: Option<(&[Vec<f64>], &[usize])>,
    ) -> Result<Self> {
        params.validate()?;
        if x.len() != y.len() {
            return Err(ModelError::Training("x and y must have the same length".into()));
        }
        if x.is_empty() {
            return Err(ModelError::NoData("cannot fit with 0 samples".into()));
        }
        if n_classes == 0 || y.iter().any(|&label| label >= n_classes) {
            return Err(ModelError::Training("labels out of class range".into()));
        }
        let n_features = x[0].len();
        if x.iter().any(|r| r.len() != n_features) {
            return Err(ModelError::Training("ragged feature rows".into()));
        }

        let train = WeightedSamples::collapse(x, y);
        let binned = BinnedFeatures::new(&train.rows, n_features);
        let eval = eval.map(|(ex, ey)| WeightedSamples::collapse(ex, ey));
        debug!(
            "Boosting on {} rows ({} distinct), {} classes, {} features",
            x.len(),
            train.len(),
            n_classes,
            n_features
        );

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n_cols = ((n_features as f64 * params.colsample_bytree) as usize).clamp(1, n_features.max(1));

        let mut margins = vec![vec![0.0; n_classes]; train.len()];
        let mut eval_margins = eval
            .as_ref()
            .map(|e| vec![vec![0.0; n_classes]; e.len()])
            .unwrap_or_default();

        let mut model = Self {
            params,
            n_classes,
            n_features,
            rounds: Vec::new(),
            best_iteration: 0,
            best_score: None,
        };

        let mut probs = vec![vec![0.0; n_classes]; train.len()];
        let mut grad = vec![0.0; train.len()];
        let mut hess = vec![0.0; train.len()];

        for round in 0..model.params.n_estimators {
            let weights = model.subsample_weights(&train.counts, &mut rng);
            let active: Vec<usize> = (0..train.len()).filter(|&i| weights[i] > 0.0).collect();

            for (m, p) in margins.iter().zip(probs.iter_mut()) {
                softmax_into(m, p);
            }

            let mut trees = Vec::with_capacity(n_classes);
            for k in 0..n_classes {
                for i in 0..train.len() {
                    let p = probs[i][k];
                    let target = if train.labels[i] == k { 1.0 } else { 0.0 };
                    grad[i] = (p - target) * weights[i];
                    hess[i] = (2.0 * p * (1.0 - p)).max(MIN_HESSIAN) * weights[i];
                }

                let features = sample_features(n_features, n_cols, &mut rng);
                let tree = TreeBuilder {
                    binned: &binned,
                    grad: &grad,
                    hess: &hess,
                    features: &features,
                    params: &model.params,
                    nodes: Vec::new(),
                }
                .build(active.clone());
                trees.push(tree);
            }

            for (row, m) in train.rows.iter().zip(margins.iter_mut()) {
                for (k, tree) in trees.iter().enumerate() {
                    m[k] += tree.predict(row);
                }
            }

            if let Some(e) = &eval {
                for (row, m) in e.rows.iter().zip(eval_margins.iter_mut()) {
                    for (k, tree) in trees.iter().enumerate() {
                        m[k] += tree.predict(row);
                    }
                }
            }
            model.rounds.push(trees);

            let Some(e) = &eval else {
                continue;
            };
            let loss = mlogloss(&eval_margins, &e.labels, &e.counts, n_classes);
            if model.best_score.map_or(true, |best| loss < best) {
                model.best_score = Some(loss);
                model.best_iteration = round;
            } else if round - model.best_iteration >= model.params.early_stopping_rounds
                && model.params.early_stopping_rounds > 0
            {
                debug!(
                    "Early stopping at round {}, best round {} (mlogloss {:.5})",
                    round,
                    model.best_iteration,
                    model.best_score.unwrap_or(loss)
                );
                break;
            }
        }

        if eval.is_some() {
            model.rounds.truncate(model.best_iteration + 1);
        } else {
            model.best_iteration = model.rounds.len().saturating_sub(1);
        }

        Ok(model)
    }

    /// Thin each sample's multiplicity by independent per-row draws
    fn subsample_weights(&self, counts: &[u32], rng: &mut StdRng) -> Vec<f64> {
        if self.params.subsample >= 1.0 {
            return counts.iter().map(|&c| f64::from(c)).collect();
        }
        counts
            .iter()
            .map(|&c| {
                (0..c)
                    .filter(|_| rng.random::<f64>() < self.params.subsample)
                    .count() as f64
            })
            .collect()
    }

    pub fn predict_margin(&self, row: &[f64]) -> Vec<f64> {
        let mut margins = vec![0.0; self.n_classes];
        for trees in &self.rounds {
            for (k, tree) in trees.iter().enumerate() {
                margins[k] += tree.predict(row);
            }
        }
        margins
    }

    /// Class probabilities (softmax of margins)
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features {
            return Err(ModelError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        let margins = self.predict_margin(row);
        let mut probs = vec![0.0; self.n_classes];
        softmax_into(&margins, &mut probs);
        Ok(probs)
    }

    /// Most probable class index; ties go to the lower index
    pub fn predict(&self, row: &[f64]) -> Result<usize> {
        let probs = self.predict_proba(row)?;
        let mut best = 0;
        for (k, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = k;
            }
        }
        Ok(best)
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Boosting rounds kept in the ensemble
    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    pub fn best_iteration(&self) -> usize {
        self.best_iteration
    }

    /// Best holdout log-loss, when fitted with an evaluation set
    pub fn best_score(&self) -> Option<f64> {
        self.best_score
    }

    pub fn params(&self) -> &BoosterParams {
        &self.params
    }

    pub fn trees(&self) -> impl Iterator<Item = &RegressionTree> {
        self.rounds.iter().flatten()
    }
}

fn sample_features(n_features: usize, n_cols: usize, rng: &mut StdRng) -> Vec<usize> {
    if n_cols >= n_features {
        return (0..n_features).collect();
    }
    let mut features = rand::seq::index::sample(rng, n_features, n_cols).into_vec();
    features.sort_unstable();
    features
}
