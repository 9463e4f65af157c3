//! End-to-end training run
//!
//! Fetch, label, write rate tables, train and persist models, then show the
//! distribution for a fresh 0-0 count against an opposite-handed pitcher.

use crate::config::Config;
use crate::error::{ModelError, Result};
use crate::ingester::{load_pa_dataset, PitchSource};
use crate::ml::{league_rates, train_model, PaContext};
use crate::model::{ProbabilityServer, Strategy};
use crate::storage::ArtifactStore;
use crate::types::{OutcomeProbs, PlatoonMatchup};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{info, warn};

/// Result of a platoon partition's training attempt
#[derive(Debug, Clone, PartialEq)]
pub enum PlatoonModelOutcome {
    Trained { path: PathBuf, accuracy: f64 },
    /// Fewer plate appearances than `min_platoon_pas`, or too few to split
    Skipped { reason: String },
}

/// What a training run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub plate_appearances: usize,
    pub platoon_counts: Vec<(PlatoonMatchup, usize)>,
    pub rates_path: Option<PathBuf>,
    pub platoon_rates_paths: Vec<PathBuf>,
    pub model_path: Option<PathBuf>,
    pub accuracy: Option<f64>,
    pub platoon_models: Vec<(PlatoonMatchup, PlatoonModelOutcome)>,
    /// Model-path distribution for 0-0, opposite hand
    pub example_probs: Option<OutcomeProbs>,
}

impl TrainingReport {
    pub fn has_data(&self) -> bool {
        self.plate_appearances > 0
    }
}

pub async fn run_training(
    config: &Config,
    source: &dyn PitchSource,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<TrainingReport> {
    let dataset = load_pa_dataset(source, start, end).await?;
    if dataset.is_empty() {
        warn!("No plate appearances between {} and {}; nothing to train", start, end);
        return Ok(TrainingReport::default());
    }

    let mut report = TrainingReport {
        plate_appearances: dataset.len(),
        platoon_counts: dataset.platoon_counts(),
        ..Default::default()
    };
    info!("Loaded {} plate appearances", report.plate_appearances);
    for (matchup, count) in &report.platoon_counts {
        info!("  {}: {} PAs", matchup, count);
    }

    let store = ArtifactStore::new(config.artifacts.resolved_dir());
    report.rates_path = Some(store.write_rates(&league_rates(&dataset, None))?);
    for matchup in PlatoonMatchup::ALL {
        let rates = league_rates(&dataset, Some(matchup));
        report
            .platoon_rates_paths
            .push(store.write_platoon_rates(matchup, &rates)?);
    }

    let model = train_model(&dataset, &config.training)?;
    info!("Holdout accuracy: {:.4}", model.meta.accuracy);
    report.accuracy = Some(model.meta.accuracy);
    report.model_path = Some(store.save_model(&model)?);

    if config.training.train_platoon_models {
        for (matchup, count) in report.platoon_counts.clone() {
            let outcome = if count < config.training.min_platoon_pas {
                info!(
                    "Skipping {} model: {} PAs below minimum {}",
                    matchup, count, config.training.min_platoon_pas
                );
                PlatoonModelOutcome::Skipped {
                    reason: format!("{} PAs", count),
                }
            } else {
                info!("Training {} model on {} PAs", matchup, count);
                match train_model(&dataset.filter_matchup(matchup), &config.training) {
                    Ok(model) => PlatoonModelOutcome::Trained {
                        path: store.save_platoon_model(matchup, &model)?,
                        accuracy: model.meta.accuracy,
                    },
                    Err(ModelError::NoData(reason)) => {
                        warn!("Skipping {} model: {}", matchup, reason);
                        PlatoonModelOutcome::Skipped { reason }
                    }
                    Err(e) => return Err(e),
                }
            };
            report.platoon_models.push((matchup, outcome));
        }
    }

    let server = ProbabilityServer::new(store);
    let example = server.query(&PaContext::new(0, 0, false), Strategy::Model)?;
    info!("Example 0-0 count, opposite hand: {}", example);
    report.example_probs = Some(example);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{parse_statcast_csv, RawPitchTable};
    use crate::ingester::MockPitchSource;
    use crate::testing::{fast_training_config, synthetic_statcast_csv};
    use crate::types::Outcome;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.artifacts.dir = dir.path().to_string_lossy().into_owned();
        config.training = fast_training_config();
        config
    }

    fn source_with(csv: String) -> MockPitchSource {
        let mut source = MockPitchSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(move |_, _| parse_statcast_csv(csv.as_bytes()));
        source
    }

    fn dates() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 9, 30).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_empty_fetch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut source = MockPitchSource::new();
        source
            .expect_fetch()
            .returning(|_, _| Ok(RawPitchTable::default()));

        let (start, end) = dates();
        let report = run_training(&config, &source, start, end).await.unwrap();
        assert!(!report.has_data());
        assert!(report.model_path.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_full_run_writes_artifacts() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.training.min_platoon_pas = 100;
        let source = source_with(synthetic_statcast_csv(500));

        let (start, end) = dates();
        let report = run_training(&config, &source, start, end).await.unwrap();

        assert_eq!(report.plate_appearances, 500);
        // synthetic rows: p_throws L for i % 5 < 2, batter always R
        assert_eq!(
            report.platoon_counts,
            vec![(PlatoonMatchup::Same, 300), (PlatoonMatchup::Opposite, 200)]
        );

        let store = ArtifactStore::new(dir.path());
        assert!(store.rates_path().exists());
        assert!(store.platoon_rates_path(PlatoonMatchup::Same).exists());
        assert!(store.platoon_rates_path(PlatoonMatchup::Opposite).exists());
        assert!(store.has_model());
        assert!(store.has_platoon_model(PlatoonMatchup::Same));
        assert!(store.has_platoon_model(PlatoonMatchup::Opposite));

        let rates = store.load_rates().unwrap();
        assert!((rates.sum() - 1.0).abs() < 1e-9);
        assert_eq!(rates.get(Outcome::Triple), 0.0);

        let accuracy = report.accuracy.unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
        let example = report.example_probs.unwrap();
        assert!((example.sum() - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_small_platoon_partitions_skipped() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let source = source_with(synthetic_statcast_csv(200));

        let (start, end) = dates();
        let report = run_training(&config, &source, start, end).await.unwrap();

        assert_eq!(report.platoon_models.len(), 2);
        for (_, outcome) in &report.platoon_models {
            assert!(matches!(outcome, PlatoonModelOutcome::Skipped { .. }));
        }
        let store = ArtifactStore::new(dir.path());
        assert!(store.has_model());
        assert!(!store.has_platoon_model(PlatoonMatchup::Same));
    }

    #[tokio::test]
    async fn test_platoon_models_disabled() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.training.min_platoon_pas = 1;
        config.training.train_platoon_models = false;
        let source = source_with(synthetic_statcast_csv(200));

        let (start, end) = dates();
        let report = run_training(&config, &source, start, end).await.unwrap();
        assert!(report.platoon_models.is_empty());
        assert_eq!(report.platoon_rates_paths.len(), 2);
    }

    #[tokio::test]
    async fn test_unlabeled_rows_fail_training() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let csv = "game_date,outcome,balls,strikes,stand,p_throws\n\
                   2024-06-01,Bunt,0,0,R,R\n\
                   2024-06-01,Balk,1,0,L,R\n"
            .to_string();
        let source = source_with(csv);

        let (start, end) = dates();
        let err = run_training(&config, &source, start, end).await.unwrap_err();
        assert!(matches!(err, ModelError::NoData(_)));
        // rates are written before training starts
        let rates = ArtifactStore::new(dir.path()).load_rates().unwrap();
        assert!(rates.is_all_zero());
    }
}
