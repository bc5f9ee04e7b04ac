use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    activity::skills_compatible,
    availability::available_slots,
    gates::{GateDecision, GateReport},
    personality::midpoint_score,
    scoring::{CompatibilityEngine, ScoreBreakdown},
};
use crate::{Activity, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrictGateConfig {
    /// Upper bound on returned matches after ranking.
    pub max_matches: usize,
    pub base_score: u8,
    /// Share of the midpoint personality score added on top of `base_score`.
    pub personality_factor: f64,
    pub score_cap: u8,
}

impl Default for StrictGateConfig {
    fn default() -> Self {
        Self {
            max_matches: 10,
            base_score: 70,
            personality_factor: 0.25,
            score_cap: 95,
        }
    }
}

/// A pairing that cleared both hard gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrictMatch {
    pub source_user_id: i64,
    pub candidate_user_id: i64,
    pub activity_id: i64,
    /// Ranking score, `min(cap, base + round(personality * factor))`.
    pub compatibility_score: u8,
    pub match_reason: String,
    /// Composite sub-scores, carried as an explanation only.
    pub breakdown: ScoreBreakdown,
}

/// Generates matches that are guaranteed to share a free slot and a compatible
/// activity.
#[derive(Clone, Default)]
pub struct StrictEligibilityGate {
    engine: CompatibilityEngine,
}

impl StrictEligibilityGate {
    pub fn new(engine: CompatibilityEngine) -> Self {
        Self { engine }
    }

    pub fn config(&self) -> &StrictGateConfig {
        &self.engine.config().strict
    }

    /// Category equality or compatible skill levels against any source activity.
    fn check_activity(&self, source: &UserProfile, activity: &Activity) -> GateDecision {
        let categories = self.engine.categories();
        let compatible = source.activities.iter().any(|own| {
            categories.same_category(&own.category, &activity.category)
                || skills_compatible(own.skill_level, activity.skill_level)
        });

        if compatible {
            GateDecision::Pass
        } else {
            GateDecision::fail(format!(
                "no source activity shares category '{}' or skill level '{}'",
                activity.category,
                activity.skill_level.as_ref()
            ))
        }
    }

    fn score(&self, source: &UserProfile, candidate: &UserProfile) -> u8 {
        let config = self.config();
        let personality = midpoint_score(
            source.user.personality_traits.as_ref(),
            candidate.user.personality_traits.as_ref(),
        );
        let bonus = (personality as f64 * config.personality_factor).round() as u32;

        (config.base_score as u32 + bonus).min(config.score_cap as u32) as u8
    }

    pub fn find_strict_matches(
        &self,
        source: &UserProfile,
        candidates: &[UserProfile],
    ) -> Vec<StrictMatch> {
        let source_slots = available_slots(&source.availability);
        if source_slots.is_empty() {
            debug!(
                source_user_id = source.user.id,
                "source has no available slots; strict gate returns nothing"
            );
            return Vec::new();
        }

        let mut matches = Vec::new();

        for candidate in candidates
            .iter()
            .filter(|c| c.user.id != source.user.id && c.user.quiz_completed)
        {
            let candidate_slots = available_slots(&candidate.availability);
            let availability = if source_slots.is_disjoint(&candidate_slots) {
                GateDecision::fail("no shared available slot")
            } else {
                GateDecision::Pass
            };

            if availability.is_fail() {
                debug!(
                    source_user_id = source.user.id,
                    candidate_user_id = candidate.user.id,
                    reason = availability.reason(),
                    "candidate rejected by availability gate"
                );
                continue;
            }

            let score = self.score(source, candidate);

            for activity in candidate.active_activities() {
                let report = GateReport::new(vec![
                    ("availability", availability.clone()),
                    ("activity", self.check_activity(source, activity)),
                ]);

                if !report.eligible {
                    debug!(
                        source_user_id = source.user.id,
                        candidate_user_id = candidate.user.id,
                        activity_id = activity.id,
                        reasons = report.failure_reasons().as_deref(),
                        "activity rejected by strict gate"
                    );
                    continue;
                }

                matches.push(StrictMatch {
                    source_user_id: source.user.id,
                    candidate_user_id: candidate.user.id,
                    activity_id: activity.id,
                    compatibility_score: score,
                    match_reason: format!(
                        "Guaranteed availability overlap and {} activity compatibility",
                        activity.category
                    ),
                    breakdown: self.engine.breakdown(source, candidate, activity),
                });
            }
        }

        matches.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));
        matches.truncate(self.config().max_matches);

        debug!(
            source_user_id = source.user.id,
            matched = matches.len(),
            "strict gate finished"
        );

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        AvailabilitySlot, DayOfWeek, PersonalityTraits, SkillLevel, TimeSlot, User,
        matching::MatchingConfig,
    };

    fn slot(user_id: i64, day: DayOfWeek, time: TimeSlot) -> AvailabilitySlot {
        AvailabilitySlot {
            user_id,
            day_of_week: day,
            time_slot: time,
            is_available: true,
        }
    }

    fn activity(id: i64, user_id: i64, category: &str, skill_level: SkillLevel) -> Activity {
        Activity {
            id,
            user_id,
            name: format!("activity {id}"),
            category: category.into(),
            skill_level,
            is_active: true,
            ..Activity::default()
        }
    }

    fn profile(
        id: i64,
        traits: Option<PersonalityTraits>,
        activities: Vec<Activity>,
        availability: Vec<AvailabilitySlot>,
    ) -> UserProfile {
        UserProfile {
            user: User {
                id,
                personality_traits: traits,
                quiz_completed: true,
                ..User::default()
            },
            activities,
            availability,
            resources: None,
        }
    }

    fn source() -> UserProfile {
        profile(
            1,
            Some(PersonalityTraits::new(80, 70, 50, 60, 90)),
            vec![activity(10, 1, "Outdoor", SkillLevel::Beginner)],
            vec![slot(1, DayOfWeek::Friday, TimeSlot::Evening)],
        )
    }

    #[test]
    fn empty_source_availability_yields_nothing() {
        let mut source = source();
        source.availability.clear();
        let candidate = profile(
            2,
            None,
            vec![activity(20, 2, "Outdoor", SkillLevel::All)],
            vec![slot(2, DayOfWeek::Friday, TimeSlot::Evening)],
        );

        let gate = StrictEligibilityGate::default();
        assert!(gate.find_strict_matches(&source, &[candidate]).is_empty());
    }

    #[test]
    fn candidates_without_shared_slot_are_skipped() {
        let candidate = profile(
            2,
            None,
            vec![activity(20, 2, "Outdoor", SkillLevel::All)],
            vec![slot(2, DayOfWeek::Monday, TimeSlot::Morning)],
        );

        let gate = StrictEligibilityGate::default();
        assert!(gate.find_strict_matches(&source(), &[candidate]).is_empty());
    }

    #[test]
    fn activity_gate_filters_per_activity() {
        let candidate = profile(
            2,
            Some(PersonalityTraits::new(80, 70, 50, 60, 90)),
            vec![
                activity(20, 2, "outdoor", SkillLevel::Advanced),
                activity(21, 2, "Cooking", SkillLevel::Advanced),
                activity(22, 2, "Cooking", SkillLevel::Beginner),
            ],
            vec![slot(2, DayOfWeek::Friday, TimeSlot::Evening)],
        );

        let gate = StrictEligibilityGate::default();
        let matches = gate.find_strict_matches(&source(), &[candidate]);
        let ids: Vec<i64> = matches.iter().map(|m| m.activity_id).collect();

        assert_eq!(ids, vec![20, 22]);
        // identical traits: 70 + 25
        assert_eq!(matches[0].compatibility_score, 95);
        assert_eq!(
            matches[0].match_reason,
            "Guaranteed availability overlap and outdoor activity compatibility"
        );
        assert_eq!(matches[0].breakdown.availability, 100);
    }

    #[test]
    fn missing_traits_score_at_midpoint_and_skip_incomplete_users() {
        let neutral = profile(
            2,
            None,
            vec![activity(20, 2, "Outdoor", SkillLevel::All)],
            vec![slot(2, DayOfWeek::Friday, TimeSlot::Evening)],
        );
        let mut incomplete = neutral.clone();
        incomplete.user.id = 3;
        incomplete.user.quiz_completed = false;

        let gate = StrictEligibilityGate::default();
        let matches = gate.find_strict_matches(&source(), &[neutral, incomplete]);

        assert_eq!(matches.len(), 1);
        // 70 + round(50 * 0.25) = 70 + 13
        assert_eq!(matches[0].compatibility_score, 83);
    }

    #[test]
    fn results_are_capped_after_sorting() {
        let config = MatchingConfig {
            strict: StrictGateConfig {
                max_matches: 2,
                ..StrictGateConfig::default()
            },
            ..MatchingConfig::default()
        };
        let gate = StrictEligibilityGate::new(CompatibilityEngine::new(config));

        let far = PersonalityTraits::new(10, 10, 10, 10, 10);
        let candidates: Vec<UserProfile> = (2..=4)
            .map(|id| {
                let traits = if id == 4 {
                    PersonalityTraits::new(80, 70, 50, 60, 90)
                } else {
                    far
                };
                profile(
                    id,
                    Some(traits),
                    vec![activity(id * 10, id, "Outdoor", SkillLevel::All)],
                    vec![slot(id, DayOfWeek::Friday, TimeSlot::Evening)],
                )
            })
            .collect();

        let matches = gate.find_strict_matches(&source(), &candidates);
        let ids: Vec<i64> = matches.iter().map(|m| m.candidate_user_id).collect();
        assert_eq!(ids, vec![4, 2]);
    }
}
