//! Probability server
//!
//! Answers "what happens in this plate appearance" queries for a simulator.
//! Two estimators sit behind the [`OutcomeSource`] trait: the empirical
//! league rate table and the trained classifier. Which one answers is an
//! explicit [`Strategy`]; asking for the model when no model artifact exists
//! selects the rate table instead of failing.


use crate::config::Config;
use crate::error::Result;
use crate::ml::{OutcomeModel, PaContext};
use crate::storage::ArtifactStore;
use crate::types::{OutcomeProbs, PlatoonMatchup};
use tracing::debug;

/// Anything that can produce a full outcome distribution for a context
pub trait OutcomeSource: Send + Sync {
    fn outcome_probs(&self, context: &PaContext) -> Result<OutcomeProbs>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Fixed empirical rates; the query context is ignored
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalRates {
    rates: OutcomeProbs,
    name: String,
}

impl EmpiricalRates {
    pub fn new(rates: OutcomeProbs) -> Self {
        Self {
            rates,
            name: "league rates".to_string(),
        }
    }

    pub fn for_matchup(rates: OutcomeProbs, matchup: PlatoonMatchup) -> Self {
        Self {
            rates,
            name: format!("league rates ({})", matchup),
        }
    }

    pub fn rates(&self) -> &OutcomeProbs {
        &self.rates
    }
}

impl OutcomeSource for EmpiricalRates {
    fn outcome_probs(&self, _context: &PaContext) -> Result<OutcomeProbs> {
        Ok(self.rates)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl OutcomeSource for OutcomeModel {
    /// Counts outside 0-3 balls / 0-2 strikes are rejected
    fn outcome_probs(&self, context: &PaContext) -> Result<OutcomeProbs> {
        context.validate()?;
        OutcomeModel::outcome_probs(self, context)
    }

    fn name(&self) -> &str {
        "gradient boosted model"
    }
}

/// Which estimator a query asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Trained classifier when its artifact exists, else empirical rates
    Model,
    /// Always the empirical rate table
    Empirical,
}

impl Strategy {
    pub fn from_use_model(use_model: bool) -> Self {
        if use_model {
            Strategy::Model
        } else {
            Strategy::Empirical
        }
    }
}

/// Serves outcome distributions from persisted artifacts
#[derive(Debug, Clone)]
pub struct ProbabilityServer {
    store: ArtifactStore,
    platoon_split: bool,
}

impl ProbabilityServer {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            platoon_split: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ArtifactStore::new(config.artifacts.resolved_dir()))
    }

    /// Prefer the matchup-specific model and rate files when present
    pub fn with_platoon_split(mut self, enabled: bool) -> Self {
        self.platoon_split = enabled;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Outcome distribution for a count and handedness matchup. Inning and
    /// outs take their defaults when the model was trained with them. Only the
    /// model path checks that the count is a legal mid-PA count.
    pub fn get_outcome_probs(
        &self,
        balls: u32,
        strikes: u32,
        same_hand: bool,
        use_model: bool,
    ) -> Result<OutcomeProbs> {
        self.query(
            &PaContext::new(balls, strikes, same_hand),
            Strategy::from_use_model(use_model),
        )
    }

    pub fn query(&self, context: &PaContext, strategy: Strategy) -> Result<OutcomeProbs> {
        let source = self.resolve_source(strategy, context.matchup())?;
        debug!(
            "Answering {}-{} ({}) from {}",
            context.balls,
            context.strikes,
            context.matchup(),
            source.name()
        );
        source.outcome_probs(context)
    }

    /// Pick the estimator for a strategy. A missing model artifact selects the
    /// empirical rates; a missing rate file is an error.
    pub fn resolve_source(
        &self,
        strategy: Strategy,
        matchup: PlatoonMatchup,
    ) -> Result<Box<dyn OutcomeSource>> {
        match strategy {
            Strategy::Model => match self.load_model(matchup)? {
                Some(model) => Ok(Box::new(model)),
                None => {
                    debug!(
                        "No model artifact in {}, using empirical rates",
                        self.store.dir().display()
                    );
                    self.empirical(matchup)
                }
            },
            Strategy::Empirical => self.empirical(matchup),
        }
    }

    fn load_model(&self, matchup: PlatoonMatchup) -> Result<Option<OutcomeModel>> {
        if self.platoon_split && self.store.has_platoon_model(matchup) {
            return self.store.load_platoon_model(matchup).map(Some);
        }
        if self.store.has_model() {
            return self.store.load_model().map(Some);
        }
        Ok(None)
    }

    fn empirical(&self, matchup: PlatoonMatchup) -> Result<Box<dyn OutcomeSource>> {
        if self.platoon_split && self.store.platoon_rates_path(matchup).exists() {
            let rates = self.store.load_platoon_rates(matchup)?;
            return Ok(Box::new(EmpiricalRates::for_matchup(rates, matchup)));
        }
        Ok(Box::new(EmpiricalRates::new(self.store.load_rates()?)))
    }
}
