//! Empirical outcome rates
//!
//! League rates straight from labeled data, no model involved. Used as the
//! baseline the simulator falls back on.

use crate::ingester::PaDataset;
use crate::types::{OutcomeProbs, PlatoonMatchup};

/// Frequency of each outcome among labeled plate appearances, optionally
/// restricted to one platoon matchup. An empty selection gives all zeros.
pub fn league_rates(dataset: &PaDataset, matchup: Option<PlatoonMatchup>) -> OutcomeProbs {
    let mut counts = [0u64; 8];
    let mut total = 0u64;

    for pa in &dataset.records {
        if matchup.is_some() && pa.platoon_matchup() != matchup {
            continue;
        }
        let Some(outcome) = pa.outcome else {
            continue;
        };
        counts[outcome.index()] += 1;
        total += 1;
    }

    if total == 0 {
        return OutcomeProbs::zeros();
    }

    let mut values = [0.0; 8];
    for (v, c) in values.iter_mut().zip(counts) {
        *v = c as f64 / total as f64;
    }
    OutcomeProbs::from_values(values)
}
