use tracing::debug;

use super::scoring::{CompatibilityEngine, MatchResult};
use crate::UserProfile;

impl CompatibilityEngine {
    /// Scores every active activity of every candidate other than `source`.
    ///
    /// Results below `min_score` (the configured threshold when `None`) are
    /// dropped. The rest are sorted by score, highest first; ties keep
    /// candidate order. There is no cap on the result count.
    pub fn find_matches(
        &self,
        source: &UserProfile,
        candidates: &[UserProfile],
        min_score: Option<u8>,
    ) -> Vec<MatchResult> {
        let threshold = min_score.unwrap_or(self.config().min_compatibility_score);

        let mut ranked: Vec<MatchResult> = candidates
            .iter()
            .filter(|candidate| candidate.user.id != source.user.id)
            .flat_map(|candidate| {
                candidate
                    .active_activities()
                    .map(move |activity| self.score_activity_match(source, candidate, activity))
            })
            .filter(|result| result.compatibility_score >= threshold)
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));

        debug!(
            source_user_id = source.user.id,
            candidates = candidates.len(),
            threshold,
            matched = ranked.len(),
            "composite ranking finished"
        );

        ranked
    }
}
