//! Core types shared across ingestion, training and lookup

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Plate appearance outcome category
///
/// Declaration order is the fixed output order used in rate files and
/// probability maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Outcome {
    Walk,
    #[serde(rename = "HBP")]
    HitByPitch,
    Single,
    Double,
    Triple,
    #[serde(rename = "HR")]
    HomeRun,
    Strikeout,
    Out,
}

impl Outcome {
    /// All categories in output order
    pub const ALL: [Outcome; 8] = [
        Outcome::Walk,
        Outcome::HitByPitch,
        Outcome::Single,
        Outcome::Double,
        Outcome::Triple,
        Outcome::HomeRun,
        Outcome::Strikeout,
        Outcome::Out,
    ];

    /// Category name as written to artifacts
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Walk => "Walk",
            Outcome::HitByPitch => "HBP",
            Outcome::Single => "Single",
            Outcome::Double => "Double",
            Outcome::Triple => "Triple",
            Outcome::HomeRun => "HR",
            Outcome::Strikeout => "Strikeout",
            Outcome::Out => "Out",
        }
    }

    /// Position in [`Outcome::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// True for outcomes where the batter reaches base
    pub fn is_on_base(&self) -> bool {
        !matches!(self, Outcome::Strikeout | Outcome::Out)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Outcome {
    type Err = String;

    /// Exact category name; raw Statcast event strings go through the classifier instead
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Outcome::ALL
            .iter()
            .copied()
            .find(|o| o.name() == s)
            .ok_or_else(|| format!("unknown outcome category: {}", s))
    }
}

/// Batter/pitcher handedness matchup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatoonMatchup {
    Same,
    Opposite,
}

impl PlatoonMatchup {
    pub const ALL: [PlatoonMatchup; 2] = [PlatoonMatchup::Same, PlatoonMatchup::Opposite];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatoonMatchup::Same => "same",
            PlatoonMatchup::Opposite => "opposite",
        }
    }

    /// Matchup from batter stance and pitcher throwing hand (case-insensitive).
    /// Unknown when either hand is missing or blank.
    pub fn from_hands(stand: Option<&str>, p_throws: Option<&str>) -> Option<Self> {
        let stand = stand.map(str::trim).filter(|s| !s.is_empty())?;
        let p_throws = p_throws.map(str::trim).filter(|s| !s.is_empty())?;
        if stand.eq_ignore_ascii_case(p_throws) {
            Some(PlatoonMatchup::Same)
        } else {
            Some(PlatoonMatchup::Opposite)
        }
    }

    pub fn from_same_hand(same_hand: bool) -> Self {
        if same_hand {
            PlatoonMatchup::Same
        } else {
            PlatoonMatchup::Opposite
        }
    }
}

impl fmt::Display for PlatoonMatchup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatoonMatchup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "same" => Ok(PlatoonMatchup::Same),
            "opposite" => Ok(PlatoonMatchup::Opposite),
            other => Err(format!("unknown platoon matchup: {}", other)),
        }
    }
}

/// One completed plate appearance (the final pitch row of a PA)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateAppearance {
    pub game_date: Option<NaiveDate>,
    /// Raw Statcast `events` string
    pub events: Option<String>,
    /// Outcome label; `None` when a pre-labeled source carried an unknown label
    pub outcome: Option<Outcome>,
    pub balls: u32,
    pub strikes: u32,
    /// Batter stance (L/R)
    pub stand: Option<String>,
    /// Pitcher throwing hand (L/R)
    pub p_throws: Option<String>,
    pub inning: Option<f64>,
    pub outs_when_up: Option<f64>,
}

impl PlateAppearance {
    pub fn platoon_matchup(&self) -> Option<PlatoonMatchup> {
        PlatoonMatchup::from_hands(self.stand.as_deref(), self.p_throws.as_deref())
    }
}

/// Probability (or frequency) for each outcome category
///
/// Serializes as a flat JSON object keyed by category name in fixed order.
/// Deserializing requires all eight categories.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct OutcomeProbs {
    values: [f64; 8],
}

impl OutcomeProbs {
    /// All-zero distribution (the rate table of an empty data set)
    pub fn zeros() -> Self {
        Self::default()
    }

    pub fn from_values(values: [f64; 8]) -> Self {
        Self { values }
    }

    pub fn get(&self, outcome: Outcome) -> f64 {
        self.values[outcome.index()]
    }

    pub fn set(&mut self, outcome: Outcome, value: f64) {
        self.values[outcome.index()] = value;
    }

    pub fn values(&self) -> &[f64; 8] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, f64)> + '_ {
        Outcome::ALL.iter().map(move |o| (*o, self.values[o.index()]))
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Highest-probability category; ties resolve to the earlier category
    pub fn most_likely(&self) -> Option<Outcome> {
        if self.is_all_zero() {
            return None;
        }
        let mut best = Outcome::ALL[0];
        for (outcome, p) in self.iter() {
            if p > self.get(best) {
                best = outcome;
            }
        }
        Some(best)
    }

    /// Name-keyed map, for callers that want a plain dictionary
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(o, p)| (o.name().to_string(), p)).collect()
    }
}

impl TryFrom<BTreeMap<String, f64>> for OutcomeProbs {
    type Error = String;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        let mut probs = OutcomeProbs::zeros();
        let mut seen = [false; 8];
        for (name, value) in map {
            let outcome = name.parse::<Outcome>()?;
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(format!("{} probability out of range: {}", name, value));
            }
            probs.set(outcome, value);
            seen[outcome.index()] = true;
        }
        let missing: Vec<&str> = Outcome::ALL
            .iter()
            .filter(|o| !seen[o.index()])
            .map(|o| o.name())
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing categories: {}", missing.join(", ")));
        }
        Ok(probs)
    }
}

impl Serialize for OutcomeProbs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Outcome::ALL.len()))?;
        for (outcome, p) in self.iter() {
            map.serialize_entry(outcome.name(), &p)?;
        }
        map.end()
    }
}

impl fmt::Display for OutcomeProbs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(o, p)| format!("{}={:.4}", o.name(), p))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
