use super::round_score;
use crate::Resources;

/// Score used when either user has not filled in resources.
pub const RESOURCES_UNKNOWN_SCORE: u8 = 70;
const NO_BUDGET_OVERLAP_SCORE: u8 = 20;
const BUDGET_OVERLAP_BONUS: f64 = 30.0;
const DEFAULT_BUDGET_MIN: i32 = 0;
const DEFAULT_BUDGET_MAX: i32 = 1000;

/// Compares two free-text locations. Implementations return 0..=100.
pub trait LocationSimilarity: Send + Sync {
    fn score(&self, a: &str, b: &str) -> u8;
}

/// Lower-cased equality or containment; no geocoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringLocation;

impl LocationSimilarity for SubstringLocation {
    fn score(&self, a: &str, b: &str) -> u8 {
        let a = a.to_lowercase();
        let b = b.to_lowercase();

        if a == b {
            100
        } else if a.contains(&b) || b.contains(&a) {
            85
        } else {
            60
        }
    }
}

pub fn score_location(
    locations: &dyn LocationSimilarity,
    a: Option<&Resources>,
    b: Option<&Resources>,
) -> u8 {
    let located = |resources: Option<&Resources>| {
        resources
            .and_then(|r| r.location.as_deref())
            .filter(|location| !location.is_empty())
            .map(str::to_owned)
    };

    match (located(a), located(b)) {
        (Some(first), Some(second)) => locations.score(&first, &second),
        _ => RESOURCES_UNKNOWN_SCORE,
    }
}

pub fn score_budget(a: Option<&Resources>, b: Option<&Resources>) -> u8 {
    let (Some(a), Some(b)) = (a, b) else {
        return RESOURCES_UNKNOWN_SCORE;
    };

    let range = |r: &Resources| {
        (
            r.budget_min.unwrap_or(DEFAULT_BUDGET_MIN) as f64,
            r.budget_max.unwrap_or(DEFAULT_BUDGET_MAX) as f64,
        )
    };
    let (a_min, a_max) = range(a);
    let (b_min, b_max) = range(b);

    let overlap_min = a_min.max(b_min);
    let overlap_max = a_max.min(b_max);
    if overlap_max < overlap_min {
        return NO_BUDGET_OVERLAP_SCORE;
    }

    let average_length = ((a_max - a_min) + (b_max - b_min)) / 2.0;
    if average_length == 0.0 {
        return 100;
    }

    let overlap = overlap_max - overlap_min;
    round_score((overlap / average_length * 100.0).round() + BUDGET_OVERLAP_BONUS)
}
