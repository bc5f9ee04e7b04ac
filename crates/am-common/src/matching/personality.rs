use super::{NEUTRAL_SCORE, round_score};
use crate::PersonalityTraits;

/// Trait similarity used by the composite engine.
///
/// Only traits that both users answered with a non-zero value are compared, so a
/// partially completed quiz narrows the comparison instead of dragging it down.
pub fn similarity_score(a: Option<&PersonalityTraits>, b: Option<&PersonalityTraits>) -> u8 {
    let (Some(a), Some(b)) = (a, b) else {
        return NEUTRAL_SCORE;
    };

    let (total, compared) = a
        .values()
        .into_iter()
        .zip(b.values())
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) if x > 0 && y > 0 => Some(x.abs_diff(y) as f64),
            _ => None,
        })
        .fold((0.0, 0u32), |(sum, count), diff| (sum + diff, count + 1));

    if compared == 0 {
        return NEUTRAL_SCORE;
    }

    round_score(100.0 - total / compared as f64)
}

/// Trait similarity used by the strict gate.
///
/// Every trait is compared; a missing or zero value counts as the midpoint 50.
/// This differs from [`similarity_score`] on purpose and the two are kept apart.
pub fn midpoint_score(a: Option<&PersonalityTraits>, b: Option<&PersonalityTraits>) -> u8 {
    let (Some(a), Some(b)) = (a, b) else {
        return NEUTRAL_SCORE;
    };

    let midpoint = |value: Option<u8>| match value {
        Some(v) if v > 0 => v,
        _ => NEUTRAL_SCORE,
    };

    let values = a.values();
    let total: f64 = values
        .iter()
        .zip(b.values())
        .map(|(x, y)| midpoint(*x).abs_diff(midpoint(y)) as f64)
        .sum();

    round_score(100.0 - total / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersonalityTraits {
        PersonalityTraits::new(80, 70, 50, 60, 90)
    }

    #[test]
    fn missing_traits_score_neutrally() {
        assert_eq!(similarity_score(None, Some(&sample())), 50);
        assert_eq!(similarity_score(Some(&sample()), None), 50);
        assert_eq!(midpoint_score(None, None), 50);
    }

    #[test]
    fn identical_vectors_are_a_perfect_match() {
        let traits = sample();
        assert_eq!(similarity_score(Some(&traits), Some(&traits)), 100);
        assert_eq!(midpoint_score(Some(&traits), Some(&traits)), 100);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = sample();
        let b = PersonalityTraits::new(20, 95, 35, 10, 60);
        assert_eq!(
            similarity_score(Some(&a), Some(&b)),
            similarity_score(Some(&b), Some(&a))
        );
        // |60|+|25|+|15|+|50|+|30| = 180 / 5 = 36
        assert_eq!(similarity_score(Some(&a), Some(&b)), 64);
    }

    #[test]
    fn similarity_skips_unanswered_traits() {
        let a = PersonalityTraits {
            extroversion: Some(80),
            adventure: Some(0),
            ..PersonalityTraits::default()
        };
        let b = PersonalityTraits::new(60, 10, 10, 10, 10);
        // only extroversion is comparable
        assert_eq!(similarity_score(Some(&a), Some(&b)), 80);
    }

    #[test]
    fn similarity_without_comparable_traits_is_neutral() {
        let empty = PersonalityTraits::default();
        assert_eq!(similarity_score(Some(&empty), Some(&sample())), 50);
    }

    #[test]
    fn midpoint_variant_fills_gaps_with_fifty() {
        let a = PersonalityTraits {
            extroversion: Some(80),
            ..PersonalityTraits::default()
        };
        let b = PersonalityTraits::new(60, 10, 10, 10, 10);
        // 20 + 40 * 4 = 180 / 5 = 36
        assert_eq!(midpoint_score(Some(&a), Some(&b)), 64);
        assert_eq!(similarity_score(Some(&a), Some(&b)), 80);
    }

    #[test]
    fn maximal_gap_floors_at_zero() {
        let low = PersonalityTraits::new(1, 1, 1, 1, 1);
        let high = PersonalityTraits::new(100, 100, 100, 100, 100);
        assert_eq!(similarity_score(Some(&low), Some(&high)), 1);
    }
}
