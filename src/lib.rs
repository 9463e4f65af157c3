//! Plate Appearance Outcome Model
//!
//! Learns what happens in a plate appearance from Statcast pitch data and
//! serves outcome distributions to a game simulator.
//!
//! ## Architecture
//!
//! ```text
//! Statcast CSV (HTTP, cached) → Ingester (classify events) → PA dataset
//!                                                              ↓
//!                          Rates (overall + platoon) ← ─ ─ ─ ─ ┤
//!                                                              ↓
//!                                      Features → Booster → Model bundle
//!                                                              ↓
//!                         ProbabilityServer (model, else empirical rates)
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod ingester;
pub mod ml;
pub mod model;
pub mod pipeline;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod error_tests;
