use serde::{Deserialize, Serialize};

use crate::{
    matching::MatchResult,
    service::{GenerateOutcome, ScoreOutcome},
    store::MatchRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateStatus {
    Matched,
    NoEligibleMatches,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateMatchesResponse {
    pub status: GenerateStatus,
    pub matches: Vec<MatchRecord>,
}

impl GenerateMatchesResponse {
    /// `None` for an unknown user, which the API reports as 404.
    pub fn from_outcome(outcome: GenerateOutcome) -> Option<Self> {
        match outcome {
            GenerateOutcome::UserNotFound => None,
            GenerateOutcome::NoEligibleCandidates => Some(Self {
                status: GenerateStatus::NoEligibleMatches,
                matches: Vec::new(),
            }),
            GenerateOutcome::Matched(matches) => Some(Self {
                status: GenerateStatus::Matched,
                matches,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreCandidateResponse {
    Scored { result: MatchResult },
    NotApplicable,
}

impl ScoreCandidateResponse {
    pub fn from_outcome(outcome: ScoreOutcome) -> Option<Self> {
        match outcome {
            ScoreOutcome::UserNotFound => None,
            ScoreOutcome::NotApplicable => Some(Self::NotApplicable),
            ScoreOutcome::Scored(result) => Some(Self::Scored { result }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedMatchesResponse {
    pub user_id: i64,
    pub min_score: u8,
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub user_id: i64,
    pub matches: Vec<MatchRecord>,
}
