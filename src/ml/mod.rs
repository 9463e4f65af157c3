//! Outcome modeling
//!
//! - Feature engineering from plate appearance context
//! - Multiclass gradient-boosted trees
//! - Training with a stratified holdout
//! - Empirical league rates

pub mod booster;
pub mod features;
pub mod rates;
pub mod trainer;


pub use booster::{BoosterParams, GradientBoostedClassifier, RegressionTree, TreeNode};
pub use features::{build_features, count_id, feature_names, FeatureMatrix, PaContext};
pub use rates::league_rates;
pub use trainer::{stratified_split, train_model, LabelEncoder, ModelMeta, OutcomeModel};
