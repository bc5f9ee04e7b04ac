use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};
use tracing::{info, instrument, warn};

use crate::{
    User, UserProfile,
    matching::{CompatibilityEngine, MatchResult, MatchingConfig, StrictEligibilityGate},
    quiz::{QuizAnswer, evaluate_quiz, known_answers},
    run_id,
    store::{MatchDecision, MatchRecord, MatchStore, NewMatch, ProfileSource, ProfileWriter, SourceError},
};

#[derive(Debug, thiserror::Error)]
pub enum MatchServiceError {
    #[error("storage failure: {0}")]
    Upstream(#[from] SourceError),
    #[error("candidate fetch task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    UserNotFound,
    /// The user exists but nobody cleared the strict gate.
    NoEligibleCandidates,
    /// Persisted records, in ranking order.
    Matched(Vec<MatchRecord>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    UserNotFound,
    /// Candidate missing or does not offer that activity.
    NotApplicable,
    Scored(MatchResult),
}

/// Ties profile storage, the scorers and match persistence together.
pub struct MatchService<S> {
    store: Arc<S>,
    engine: CompatibilityEngine,
    gate: StrictEligibilityGate,
}

impl<S> Clone for MatchService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            engine: self.engine.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl<S> MatchService<S>
where
    S: ProfileSource + MatchStore + 'static,
{
    pub fn new(store: Arc<S>, config: MatchingConfig) -> Self {
        let engine = CompatibilityEngine::new(config);
        Self {
            store,
            gate: StrictEligibilityGate::new(engine.clone()),
            engine,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn engine(&self) -> &CompatibilityEngine {
        &self.engine
    }

    /// Loads full profiles for `users`, one task per user, returned in input order.
    /// Outstanding fetches are aborted as soon as one of them fails.
    async fn load_profiles(&self, users: Vec<User>) -> Result<Vec<UserProfile>, MatchServiceError> {
        let mut tasks: JoinSet<(usize, Result<UserProfile, SourceError>)> = JoinSet::new();
        let total = users.len();

        for (index, user) in users.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            tasks.spawn(async move {
                let id = user.id;
                let fetched = tokio::try_join!(
                    store.activities_by_user(id),
                    store.availability_by_user(id),
                    store.resources_by_user(id),
                );

                let profile = fetched.map(|(activities, availability, resources)| UserProfile {
                    user,
                    activities,
                    availability,
                    resources,
                });
                (index, profile)
            });
        }

        let mut slots: Vec<Option<UserProfile>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, profile) = joined?;
            slots[index] = Some(profile?);
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Strict generation for `user_id`; the results are persisted.
    #[instrument(skip(self))]
    pub async fn generate_matches(&self, user_id: i64) -> Result<GenerateOutcome, MatchServiceError> {
        let Some(source) = self.store.user_with_details(user_id).await? else {
            return Ok(GenerateOutcome::UserNotFound);
        };

        let candidates: Vec<User> = self
            .store
            .all_users()
            .await?
            .into_iter()
            .filter(|u| u.id != user_id && u.quiz_completed)
            .collect();
        let candidates = self.load_profiles(candidates).await?;

        let strict = self.gate.find_strict_matches(&source, &candidates);
        if strict.is_empty() {
            info!(user_id, candidates = candidates.len(), "no eligible candidates");
            return Ok(GenerateOutcome::NoEligibleCandidates);
        }

        let run_id = run_id::next_run();
        let new_matches = strict
            .into_iter()
            .map(|m| NewMatch {
                user_id,
                matched_user_id: m.candidate_user_id,
                activity_id: m.activity_id,
                compatibility_score: m.compatibility_score,
                match_reason: m.match_reason,
                breakdown: Some(m.breakdown),
                run_id: run_id.clone(),
            })
            .collect();

        let records = self.store.save_matches(new_matches).await?;
        info!(user_id, %run_id, matched = records.len(), "matches generated");

        Ok(GenerateOutcome::Matched(records))
    }

    /// Composite ranking against every other user. Nothing is persisted.
    #[instrument(skip(self))]
    pub async fn rank_matches(
        &self,
        user_id: i64,
        min_score: Option<u8>,
    ) -> Result<Option<Vec<MatchResult>>, MatchServiceError> {
        let Some(source) = self.store.user_with_details(user_id).await? else {
            return Ok(None);
        };

        let others: Vec<User> = self
            .store
            .all_users()
            .await?
            .into_iter()
            .filter(|u| u.id != user_id)
            .collect();
        let candidates = self.load_profiles(others).await?;

        Ok(Some(self.engine.find_matches(&source, &candidates, min_score)))
    }

    #[instrument(skip(self))]
    pub async fn score_candidate(
        &self,
        user_id: i64,
        candidate_id: i64,
        activity_id: i64,
    ) -> Result<ScoreOutcome, MatchServiceError> {
        let Some(source) = self.store.user_with_details(user_id).await? else {
            return Ok(ScoreOutcome::UserNotFound);
        };
        let Some(candidate) = self.store.user_with_details(candidate_id).await? else {
            return Ok(ScoreOutcome::NotApplicable);
        };

        Ok(self
            .engine
            .calculate_compatibility(&source, &candidate, activity_id)
            .map_or(ScoreOutcome::NotApplicable, ScoreOutcome::Scored))
    }

    #[instrument(skip(self))]
    pub async fn record_decision(
        &self,
        match_id: i64,
        decision: MatchDecision,
    ) -> Result<Option<MatchRecord>, MatchServiceError> {
        let updated = self
            .store
            .update_match_status(match_id, decision.into())
            .await?;
        if updated.is_some() {
            info!(match_id, ?decision, "match decision recorded");
        }
        Ok(updated)
    }

    pub async fn matches_for_user(&self, user_id: i64) -> Result<Vec<MatchRecord>, MatchServiceError> {
        Ok(self.store.matches_for_user(user_id).await?)
    }
}

impl<S> MatchService<S>
where
    S: ProfileSource + ProfileWriter + MatchStore + 'static,
{
    /// Derives the personality from `answers` and stores it. `None` when the user
    /// is unknown.
    #[instrument(skip(self, answers), fields(answers = answers.len()))]
    pub async fn complete_quiz(
        &self,
        user_id: i64,
        answers: Vec<QuizAnswer>,
    ) -> Result<Option<User>, MatchServiceError> {
        if self.store.user(user_id).await?.is_none() {
            return Ok(None);
        }

        let questions = self.store.personality_questions().await?;
        let submitted = answers.len();
        let answers = known_answers(&questions, answers);
        if answers.len() < submitted {
            warn!(user_id, dropped = submitted - answers.len(), "ignoring answers to unknown questions or options");
        }

        let outcome = evaluate_quiz(&questions, &answers);
        info!(user_id, personality_type = %outcome.personality_type, "quiz completed");

        Ok(self.store.complete_quiz(user_id, answers, outcome).await?)
    }
}
