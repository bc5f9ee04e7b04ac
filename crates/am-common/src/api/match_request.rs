use serde::Deserialize;

use crate::store::{MatchDecision, MatchStatus};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GenerateMatchesRequest {
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoreCandidateRequest {
    pub user_id: i64,
    pub candidate_id: i64,
    pub activity_id: i64,
}

/// Accepts any stored status so that `pending` is rejected by the handler
/// with a clear message rather than a deserialization error.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MatchStatusRequest {
    pub status: MatchStatus,
}

impl MatchStatusRequest {
    pub fn decision(&self) -> Option<MatchDecision> {
        match self.status {
            MatchStatus::Connected => Some(MatchDecision::Connected),
            MatchStatus::Skipped => Some(MatchDecision::Skipped),
            MatchStatus::Pending => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RankedQuery {
    #[serde(default)]
    pub min_score: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_not_a_decision() {
        let req: MatchStatusRequest =
            serde_json::from_value(serde_json::json!({"status": "pending"})).unwrap();
        assert_eq!(req.decision(), None);

        let req: MatchStatusRequest =
            serde_json::from_value(serde_json::json!({"status": "skipped"})).unwrap();
        assert_eq!(req.decision(), Some(MatchDecision::Skipped));
    }
}
