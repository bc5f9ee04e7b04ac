//! Storage seams used by the match service.
//!
//! `db::PgStore` is the production implementation; [`memory::InMemoryStore`]
//! backs tests and local runs without Postgres.

pub mod memory;

use std::future::Future;

use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use tokio_postgres::Error as PgError;

use crate::{
    Activity, AvailabilitySlot, Resources, User, UserProfile,
    matching::ScoreBreakdown,
    quiz::{PersonalityQuestion, QuizAnswer, QuizOutcome},
};

pub use memory::InMemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("stored row could not be decoded: {0}")]
    Decode(String),
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Connected,
    Skipped,
}

/// A user's response to a proposed match. `pending` is never a valid decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDecision {
    Connected,
    Skipped,
}

impl From<MatchDecision> for MatchStatus {
    fn from(decision: MatchDecision) -> Self {
        match decision {
            MatchDecision::Connected => MatchStatus::Connected,
            MatchDecision::Skipped => MatchStatus::Skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub user_id: i64,
    pub matched_user_id: i64,
    pub activity_id: i64,
    pub compatibility_score: u8,
    pub match_reason: String,
    pub breakdown: Option<ScoreBreakdown>,
    /// Generation run that produced or last refreshed the row.
    pub run_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: i64,
    pub user_id: i64,
    pub matched_user_id: i64,
    pub activity_id: i64,
    pub compatibility_score: u8,
    pub match_reason: String,
    pub breakdown: Option<ScoreBreakdown>,
    pub status: MatchStatus,
    pub run_id: String,
    pub matched_at: DateTime<Utc>,
}

/// Read access to users and everything attached to them.
pub trait ProfileSource: Send + Sync {
    fn user(&self, id: i64) -> impl Future<Output = Result<Option<User>, SourceError>> + Send;

    /// Every user, ordered by id.
    fn all_users(&self) -> impl Future<Output = Result<Vec<User>, SourceError>> + Send;

    fn activities_by_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<Activity>, SourceError>> + Send;

    fn availability_by_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<AvailabilitySlot>, SourceError>> + Send;

    fn resources_by_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<Resources>, SourceError>> + Send;

    /// The user plus activities, availability and resources; `None` when the
    /// user does not exist.
    fn user_with_details(
        &self,
        id: i64,
    ) -> impl Future<Output = Result<Option<UserProfile>, SourceError>> + Send {
        async move {
            let Some(user) = self.user(id).await? else {
                return Ok(None);
            };

            let (activities, availability, resources) = tokio::try_join!(
                self.activities_by_user(id),
                self.availability_by_user(id),
                self.resources_by_user(id),
            )?;

            Ok(Some(UserProfile {
                user,
                activities,
                availability,
                resources,
            }))
        }
    }
}

/// Profile mutations exposed over the API.
pub trait ProfileWriter: Send + Sync {
    /// Replaces the user's whole weekly grid. `None` when the user is unknown.
    fn replace_availability(
        &self,
        user_id: i64,
        slots: Vec<AvailabilitySlot>,
    ) -> impl Future<Output = Result<Option<Vec<AvailabilitySlot>>, SourceError>> + Send;

    fn upsert_resources(
        &self,
        user_id: i64,
        resources: Resources,
    ) -> impl Future<Output = Result<Option<Resources>, SourceError>> + Send;

    fn personality_questions(
        &self,
    ) -> impl Future<Output = Result<Vec<PersonalityQuestion>, SourceError>> + Send;

    /// Stores the answers and the derived personality, marking the quiz as
    /// completed. `None` when the user is unknown.
    fn complete_quiz(
        &self,
        user_id: i64,
        answers: Vec<QuizAnswer>,
        outcome: QuizOutcome,
    ) -> impl Future<Output = Result<Option<User>, SourceError>> + Send;
}

/// Persistence for generated matches.
pub trait MatchStore: Send + Sync {
    /// Upserts on `(user_id, matched_user_id, activity_id)`. Existing rows get
    /// the new score, reason, breakdown and run id but keep their status.
    /// Records come back in input order.
    fn save_matches(
        &self,
        matches: Vec<NewMatch>,
    ) -> impl Future<Output = Result<Vec<MatchRecord>, SourceError>> + Send;

    fn update_match_status(
        &self,
        id: i64,
        status: MatchStatus,
    ) -> impl Future<Output = Result<Option<MatchRecord>, SourceError>> + Send;

    /// Newest first.
    fn matches_for_user(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<MatchRecord>, SourceError>> + Send;
}
