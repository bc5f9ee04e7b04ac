use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    activity::{CaseInsensitiveCategories, CategorySimilarity, score_activity},
    availability::score_availability,
    personality::similarity_score,
    reason::generate_match_reason,
    resources::{LocationSimilarity, SubstringLocation, score_budget, score_location},
    round_score,
    strict::StrictGateConfig,
    weights::{DEFAULT_WEIGHTS, MatchingWeights},
};
use crate::{Activity, UserProfile};

pub const DEFAULT_MIN_COMPATIBILITY_SCORE: u8 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    pub weights: MatchingWeights,
    /// Composite results below this score are dropped by `find_matches`.
    pub min_compatibility_score: u8,
    pub strict: StrictGateConfig,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            min_compatibility_score: DEFAULT_MIN_COMPATIBILITY_SCORE,
            strict: StrictGateConfig::default(),
        }
    }
}

impl MatchingConfig {
    /// Reads `AM_WEIGHT_*`, `AM_MIN_COMPATIBILITY_SCORE` and `AM_STRICT_MATCH_LIMIT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            weights: MatchingWeights::from_env(),
            min_compatibility_score: std::env::var("AM_MIN_COMPATIBILITY_SCORE")
                .ok()
                .and_then(|s| s.parse::<u8>().ok())
                .map(|v| v.min(100))
                .unwrap_or(defaults.min_compatibility_score),
            strict: StrictGateConfig {
                max_matches: std::env::var("AM_STRICT_MATCH_LIMIT")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(defaults.strict.max_matches),
                ..defaults.strict
            },
        }
    }
}

/// The five sub-scores behind a compatibility score, each 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub personality: u8,
    pub activity: u8,
    pub availability: u8,
    pub location: u8,
    pub budget: u8,
}

impl ScoreBreakdown {
    pub fn weighted_total(&self, weights: &MatchingWeights) -> u8 {
        let total = self.personality as f64 * weights.personality
            + self.activity as f64 * weights.activity
            + self.availability as f64 * weights.availability
            + self.location as f64 * weights.location
            + self.budget as f64 * weights.budget;

        round_score(total)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub source_user_id: i64,
    pub candidate_user_id: i64,
    pub activity_id: i64,
    pub compatibility_score: u8,
    pub breakdown: ScoreBreakdown,
    pub match_reason: String,
}

/// Composite compatibility scorer. Holds no mutable state; one instance can be
/// shared across requests.
#[derive(Clone)]
pub struct CompatibilityEngine {
    config: MatchingConfig,
    categories: Arc<dyn CategorySimilarity>,
    locations: Arc<dyn LocationSimilarity>,
}

impl Default for CompatibilityEngine {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl CompatibilityEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self::with_strategies(
            config,
            Arc::new(CaseInsensitiveCategories),
            Arc::new(SubstringLocation),
        )
    }

    pub fn with_strategies(
        config: MatchingConfig,
        categories: Arc<dyn CategorySimilarity>,
        locations: Arc<dyn LocationSimilarity>,
    ) -> Self {
        Self {
            config,
            categories,
            locations,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn categories(&self) -> &dyn CategorySimilarity {
        self.categories.as_ref()
    }

    /// Runs every sub-scorer for `activity` offered by `candidate`.
    pub fn breakdown(
        &self,
        source: &UserProfile,
        candidate: &UserProfile,
        activity: &Activity,
    ) -> ScoreBreakdown {
        ScoreBreakdown {
            personality: similarity_score(
                source.user.personality_traits.as_ref(),
                candidate.user.personality_traits.as_ref(),
            ),
            activity: score_activity(self.categories.as_ref(), activity, &source.activities),
            availability: score_availability(&source.availability, &candidate.availability),
            location: score_location(
                self.locations.as_ref(),
                source.resources.as_ref(),
                candidate.resources.as_ref(),
            ),
            budget: score_budget(source.resources.as_ref(), candidate.resources.as_ref()),
        }
    }

    /// Scores `source` against one of `candidate`'s activities.
    ///
    /// Returns `None` when the candidate no longer has that activity.
    pub fn calculate_compatibility(
        &self,
        source: &UserProfile,
        candidate: &UserProfile,
        activity_id: i64,
    ) -> Option<MatchResult> {
        let activity = candidate.activities.iter().find(|a| a.id == activity_id)?;
        Some(self.score_activity_match(source, candidate, activity))
    }

    pub(crate) fn score_activity_match(
        &self,
        source: &UserProfile,
        candidate: &UserProfile,
        activity: &Activity,
    ) -> MatchResult {
        let breakdown = self.breakdown(source, candidate, activity);

        MatchResult {
            source_user_id: source.user.id,
            candidate_user_id: candidate.user.id,
            activity_id: activity.id,
            compatibility_score: breakdown.weighted_total(&self.config.weights),
            match_reason: generate_match_reason(&breakdown, &activity.category),
            breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AvailabilitySlot, DayOfWeek, PersonalityTraits, Resources, SkillLevel, TimeSlot, User};

    fn friday_evening(user_id: i64) -> AvailabilitySlot {
        AvailabilitySlot {
            user_id,
            day_of_week: DayOfWeek::Friday,
            time_slot: TimeSlot::Evening,
            is_available: true,
        }
    }

    fn profile(id: i64, category: &str) -> UserProfile {
        UserProfile {
            user: User {
                id,
                name: format!("user-{id}"),
                personality_traits: Some(PersonalityTraits::new(80, 70, 50, 60, 90)),
                quiz_completed: true,
                ..User::default()
            },
            activities: vec![Activity {
                id: id * 10,
                user_id: id,
                name: format!("activity-{id}"),
                category: category.into(),
                skill_level: SkillLevel::All,
                is_active: true,
                ..Activity::default()
            }],
            availability: vec![friday_evening(id)],
            resources: None,
        }
    }

    #[test]
    fn reference_scenario_scores_96() {
        let engine = CompatibilityEngine::default();
        let source = profile(1, "Outdoor");
        let candidate = profile(2, "Outdoor");

        let result = engine
            .calculate_compatibility(&source, &candidate, 20)
            .expect("activity exists");

        assert_eq!(
            result.breakdown,
            ScoreBreakdown {
                personality: 100,
                activity: 95,
                availability: 100,
                location: 70,
                budget: 70,
            }
        );
        assert_eq!(result.compatibility_score, 96);
        assert_eq!(result.source_user_id, 1);
        assert_eq!(result.candidate_user_id, 2);
        assert_eq!(
            result.match_reason,
            "highly compatible personalities, shared activity interests, and excellent schedule compatibility"
        );
    }

    #[test]
    fn unknown_activity_is_not_found() {
        let engine = CompatibilityEngine::default();
        assert!(
            engine
                .calculate_compatibility(&profile(1, "Outdoor"), &profile(2, "Outdoor"), 999)
                .is_none()
        );
    }

    #[test]
    fn custom_weights_change_the_blend() {
        let config = MatchingConfig {
            weights: MatchingWeights {
                personality: 0.0,
                activity: 0.0,
                availability: 0.0,
                location: 0.5,
                budget: 0.5,
            },
            ..MatchingConfig::default()
        };
        let engine = CompatibilityEngine::new(config);
        let mut source = profile(1, "Outdoor");
        let mut candidate = profile(2, "Outdoor");
        source.resources = Some(Resources {
            location: Some("Austin".into()),
            budget_min: Some(0),
            budget_max: Some(50),
            ..Resources::default()
        });
        candidate.resources = Some(Resources {
            location: Some("Denver".into()),
            budget_min: Some(100),
            budget_max: Some(150),
            ..Resources::default()
        });

        let result = engine.calculate_compatibility(&source, &candidate, 20).unwrap();
        // (60 + 20) / 2
        assert_eq!(result.compatibility_score, 40);
    }

    #[test]
    fn location_strategy_is_pluggable() {
        struct AlwaysNear;
        impl LocationSimilarity for AlwaysNear {
            fn score(&self, _a: &str, _b: &str) -> u8 {
                100
            }
        }

        let engine = CompatibilityEngine::with_strategies(
            MatchingConfig::default(),
            Arc::new(CaseInsensitiveCategories),
            Arc::new(AlwaysNear),
        );
        let mut source = profile(1, "Outdoor");
        let mut candidate = profile(2, "Outdoor");
        source.resources = Some(Resources {
            location: Some("Austin".into()),
            ..Resources::default()
        });
        candidate.resources = Some(Resources {
            location: Some("Oslo".into()),
            ..Resources::default()
        });

        let result = engine.calculate_compatibility(&source, &candidate, 20).unwrap();
        assert_eq!(result.breakdown.location, 100);
    }
}
