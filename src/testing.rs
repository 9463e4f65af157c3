//! Shared fixtures for unit tests

use crate::config::TrainingConfig;
use crate::ingester::PaDataset;
use crate::types::{Outcome, OutcomeProbs, PlateAppearance};

/// One labeled plate appearance with inning 1, nobody out
pub fn plate_appearance(
    outcome: Outcome,
    balls: u32,
    strikes: u32,
    stand: &str,
    p_throws: &str,
) -> PlateAppearance {
    PlateAppearance {
        outcome: Some(outcome),
        balls,
        strikes,
        stand: Some(stand.to_string()),
        p_throws: Some(p_throws.to_string()),
        inning: Some(1.0),
        outs_when_up: Some(0.0),
        ..Default::default()
    }
}

/// Deterministic data where the count carries most of the signal:
/// three-ball counts are mostly walks, two-strike counts often strikeouts.
pub fn synthetic_dataset(n: usize) -> PaDataset {
    let mut records = Vec::with_capacity(n);
    for i in 0..n {
        let balls = (i % 4) as u32;
        let strikes = ((i / 4) % 3) as u32;
        let outcome = if balls == 3 && (i / 12) % 3 != 0 {
            Outcome::Walk
        } else if strikes == 2 && i % 2 == 0 {
            Outcome::Strikeout
        } else {
            match i % 7 {
                0 => Outcome::Single,
                1 => Outcome::Double,
                2 => Outcome::HomeRun,
                _ => Outcome::Out,
            }
        };
        let p_throws = if i % 5 < 2 { "L" } else { "R" };
        let mut record = plate_appearance(outcome, balls, strikes, "R", p_throws);
        record.inning = Some((1 + i % 9) as f64);
        record.outs_when_up = Some(((i / 36) % 3) as f64);
        records.push(record);
    }
    PaDataset::new(records)
}

/// Small ensemble so tests train in milliseconds
pub fn fast_training_config() -> TrainingConfig {
    TrainingConfig {
        n_estimators: 30,
        max_depth: 3,
        learning_rate: 0.2,
        ..Default::default()
    }
}

/// League-like rate table
pub fn sample_rates() -> OutcomeProbs {
    OutcomeProbs::from_values([0.08, 0.01, 0.15, 0.05, 0.005, 0.03, 0.22, 0.455])
}

/// Statcast-style CSV for `synthetic_dataset(n)`, with a non-final pitch
/// (empty `events`) ahead of every plate appearance
pub fn synthetic_statcast_csv(n: usize) -> String {
    let mut csv = String::from("game_date,events,balls,strikes,stand,p_throws,inning,outs_when_up\n");
    for pa in synthetic_dataset(n).records {
        let event = match pa.outcome {
            Some(Outcome::Walk) => "walk",
            Some(Outcome::Strikeout) => "strikeout",
            Some(Outcome::Single) => "single",
            Some(Outcome::Double) => "double",
            Some(Outcome::HomeRun) => "home_run",
            _ => "field_out",
        };
        let stand = pa.stand.as_deref().unwrap_or("");
        let p_throws = pa.p_throws.as_deref().unwrap_or("");
        let inning = pa.inning.unwrap_or(1.0);
        let outs = pa.outs_when_up.unwrap_or(0.0);
        csv.push_str(&format!(
            "2024-06-01,,0,0,{},{},{},{}\n",
            stand, p_throws, inning, outs
        ));
        csv.push_str(&format!(
            "2024-06-01,{},{},{},{},{},{},{}\n",
            event, pa.balls, pa.strikes, stand, p_throws, inning, outs
        ));
    }
    csv
}
