use crate::{Activity, SkillLevel};

const BASE_SCORE: i32 = 60;
const RELATED_ACTIVITY_BONUS: i32 = 20;
const SKILL_FIT_BONUS: i32 = 15;
const SKILL_GAP_PENALTY: i32 = 10;

/// Decides whether two activities belong together.
///
/// The default is a loose string heuristic; a taxonomy-backed implementation can
/// replace it without touching score composition.
pub trait CategorySimilarity: Send + Sync {
    fn same_category(&self, a: &str, b: &str) -> bool;

    fn related_names(&self, a: &str, b: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveCategories;

impl CategorySimilarity for CaseInsensitiveCategories {
    fn same_category(&self, a: &str, b: &str) -> bool {
        a.to_lowercase() == b.to_lowercase()
    }

    fn related_names(&self, a: &str, b: &str) -> bool {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        a.contains(&b) || b.contains(&a)
    }
}

/// Either side open to all levels, or the same level.
pub fn skills_compatible(a: SkillLevel, b: SkillLevel) -> bool {
    a == SkillLevel::All || b == SkillLevel::All || a == b
}

fn skills_far_apart(a: SkillLevel, b: SkillLevel) -> bool {
    matches!(
        (a, b),
        (SkillLevel::Beginner, SkillLevel::Advanced) | (SkillLevel::Advanced, SkillLevel::Beginner)
    )
}

/// Scores how well `target` (a candidate's activity) fits the source user's activities.
pub fn score_activity(
    categories: &dyn CategorySimilarity,
    target: &Activity,
    source_activities: &[Activity],
) -> u8 {
    let mut score = BASE_SCORE;

    let has_related = source_activities.iter().any(|own| {
        categories.same_category(&own.category, &target.category)
            || categories.related_names(&own.name, &target.name)
    });
    if has_related {
        score += RELATED_ACTIVITY_BONUS;
    }

    // The first same-category activity stands in for the source's skill level.
    if let Some(own) = source_activities
        .iter()
        .find(|own| categories.same_category(&own.category, &target.category))
    {
        if skills_compatible(own.skill_level, target.skill_level) {
            score += SKILL_FIT_BONUS;
        } else if skills_far_apart(own.skill_level, target.skill_level) {
            score -= SKILL_GAP_PENALTY;
        }
    }

    score.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(name: &str, category: &str, skill_level: SkillLevel) -> Activity {
        Activity {
            name: name.into(),
            category: category.into(),
            skill_level,
            is_active: true,
            ..Activity::default()
        }
    }

    #[test]
    fn shared_category_with_open_level_scores_95() {
        let own = vec![activity("Hiking", "Outdoor", SkillLevel::All)];
        let target = activity("Rock climbing", "Outdoor", SkillLevel::Advanced);
        assert_eq!(score_activity(&CaseInsensitiveCategories, &target, &own), 95);
    }

    #[test]
    fn category_comparison_ignores_case() {
        let own = vec![activity("Hiking", "outdoor", SkillLevel::Intermediate)];
        let target = activity("Trail run", "OUTDOOR", SkillLevel::Intermediate);
        assert_eq!(score_activity(&CaseInsensitiveCategories, &target, &own), 95);
    }

    #[test]
    fn beginner_against_advanced_is_penalised() {
        let own = vec![activity("Bouldering", "Climbing", SkillLevel::Beginner)];
        let target = activity("Lead climbing", "Climbing", SkillLevel::Advanced);
        assert_eq!(score_activity(&CaseInsensitiveCategories, &target, &own), 70);
    }

    #[test]
    fn adjacent_levels_do_not_move_the_score() {
        let own = vec![activity("Bouldering", "Climbing", SkillLevel::Beginner)];
        let target = activity("Gym session", "Climbing", SkillLevel::Intermediate);
        assert_eq!(score_activity(&CaseInsensitiveCategories, &target, &own), 80);
    }

    #[test]
    fn related_name_without_shared_category_only_adds_bonus() {
        let own = vec![activity("Board games", "Indoor", SkillLevel::All)];
        let target = activity("board games night", "Social", SkillLevel::All);
        assert_eq!(score_activity(&CaseInsensitiveCategories, &target, &own), 80);
    }

    #[test]
    fn unrelated_activities_keep_base_score() {
        let own = vec![activity("Chess", "Games", SkillLevel::Advanced)];
        let target = activity("Surfing", "Water", SkillLevel::Beginner);
        assert_eq!(score_activity(&CaseInsensitiveCategories, &target, &own), 60);
        assert_eq!(score_activity(&CaseInsensitiveCategories, &target, &[]), 60);
    }

    #[test]
    fn skill_compatibility_rules() {
        assert!(skills_compatible(SkillLevel::All, SkillLevel::Advanced));
        assert!(skills_compatible(SkillLevel::Beginner, SkillLevel::Beginner));
        assert!(!skills_compatible(SkillLevel::Beginner, SkillLevel::Intermediate));
    }
}
