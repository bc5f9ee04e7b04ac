use super::scoring::ScoreBreakdown;

fn tiered(score: u8, strong: &'static str, fair: Option<&'static str>) -> Option<&'static str> {
    if score >= 80 {
        Some(strong)
    } else if score >= 60 {
        fair
    } else {
        None
    }
}

/// Builds the human-readable explanation for a composite match.
///
/// Fragments are checked in a fixed order so the wording is deterministic for a
/// given breakdown.
pub fn generate_match_reason(breakdown: &ScoreBreakdown, category: &str) -> String {
    let reasons: Vec<&str> = [
        tiered(
            breakdown.personality,
            "highly compatible personalities",
            Some("complementary personality traits"),
        ),
        tiered(
            breakdown.activity,
            "shared activity interests",
            Some("similar activity preferences"),
        ),
        tiered(
            breakdown.availability,
            "excellent schedule compatibility",
            Some("good availability overlap"),
        ),
        tiered(breakdown.budget, "matching budget preferences", None),
        tiered(breakdown.location, "nearby location", None),
    ]
    .into_iter()
    .flatten()
    .collect();

    match reasons.as_slice() {
        [] => format!("Both interested in {} activities", category.to_lowercase()),
        [only] => format!("Match based on {only}"),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}
