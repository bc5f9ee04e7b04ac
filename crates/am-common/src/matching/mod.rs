pub mod activity;
pub mod availability;
pub mod gates;
pub mod personality;
pub mod pipeline;
pub mod reason;
pub mod resources;
pub mod scoring;
pub mod strict;
pub mod weights;

pub use activity::{CaseInsensitiveCategories, CategorySimilarity};
pub use gates::{GateDecision, GateReport};
pub use resources::{LocationSimilarity, SubstringLocation};
pub use scoring::{CompatibilityEngine, MatchResult, MatchingConfig, ScoreBreakdown};
pub use strict::{StrictEligibilityGate, StrictGateConfig, StrictMatch};
pub use weights::{DEFAULT_WEIGHTS, MatchingWeights};

/// Score returned whenever one side has not supplied the data a scorer needs.
pub const NEUTRAL_SCORE: u8 = 50;

/// Rounds a 0..=100 score and clamps it into range.
pub(crate) fn round_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
