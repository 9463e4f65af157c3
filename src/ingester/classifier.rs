//! Statcast event classification
//!
//! Maps a raw `events` string onto one of the eight outcome categories using
//! an ordered rule list. Rules are pattern-based rather than an exhaustive
//! event table, so event types Statcast adds later still land somewhere:
//! anything unmatched becomes `Out`.

use crate::types::Outcome;

/// How a rule tests the normalized event string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPattern {
    Exact(&'static str),
    Contains(&'static str),
}

impl EventPattern {
    fn matches(&self, event: &str) -> bool {
        match self {
            EventPattern::Exact(s) => event == *s,
            EventPattern::Contains(s) => event.contains(s),
        }
    }
}

/// A single classification rule
#[derive(Debug, Clone, Copy)]
pub struct EventRule {
    pub pattern: EventPattern,
    pub outcome: Outcome,
}

const fn rule(pattern: EventPattern, outcome: Outcome) -> EventRule {
    EventRule { pattern, outcome }
}

/// Rules in evaluation order; first match wins.
///
/// `double_play` and `triple_play` must stay ahead of the plain `double` and
/// `triple` rules. They also precede `strikeout`, so `strikeout_double_play`
/// is an `Out`.
pub const EVENT_RULES: &[EventRule] = &[
    rule(EventPattern::Exact("walk"), Outcome::Walk),
    rule(EventPattern::Exact("hit_by_pitch"), Outcome::HitByPitch),
    rule(EventPattern::Exact("single"), Outcome::Single),
    rule(EventPattern::Contains("double_play"), Outcome::Out),
    rule(EventPattern::Exact("double"), Outcome::Double),
    rule(EventPattern::Contains("triple_play"), Outcome::Out),
    rule(EventPattern::Exact("triple"), Outcome::Triple),
    rule(EventPattern::Exact("home_run"), Outcome::HomeRun),
    rule(EventPattern::Contains("strikeout"), Outcome::Strikeout),
];

/// Classify a raw event string. Missing events and unmatched strings are `Out`.
pub fn classify_event(event: Option<&str>) -> Outcome {
    let Some(event) = event else {
        return Outcome::Out;
    };
    let normalized = event.trim().to_lowercase();
    EVENT_RULES
        .iter()
        .find(|r| r.pattern.matches(&normalized))
        .map(|r| r.outcome)
        .unwrap_or(Outcome::Out)
}
