use std::time::Instant;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use metrics::{counter, histogram};

use am_common::{
    api::{
        GenerateMatchesRequest, GenerateMatchesResponse, MatchStatusRequest, MatchesResponse,
        RankedMatchesResponse, RankedQuery, ScoreCandidateRequest, ScoreCandidateResponse,
    },
    service::GenerateOutcome,
    store::{MatchDecision, MatchRecord},
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::{SharedState, store::AppStore};

fn user_not_found(user_id: i64) -> ApiError {
    ApiError::NotFound(format!("user {user_id} not found"))
}

pub async fn generate<S: AppStore>(
    State(state): State<SharedState<S>>,
    _auth: AuthUser,
    Json(request): Json<GenerateMatchesRequest>,
) -> Result<Json<GenerateMatchesResponse>, ApiError> {
    let started = Instant::now();
    let outcome = state.service.generate_matches(request.user_id).await?;
    histogram!(am_metrics::GENERATION_SECONDS).record(started.elapsed().as_secs_f64());

    let label = match &outcome {
        GenerateOutcome::UserNotFound => "not_found",
        GenerateOutcome::NoEligibleCandidates => "no_eligible",
        GenerateOutcome::Matched(records) => {
            counter!(am_metrics::MATCHES_GENERATED).increment(records.len() as u64);
            "matched"
        }
    };
    counter!(am_metrics::GENERATION_REQUESTS, "outcome" => label).increment(1);

    GenerateMatchesResponse::from_outcome(outcome)
        .map(Json)
        .ok_or_else(|| user_not_found(request.user_id))
}

pub async fn list_for_user<S: AppStore>(
    State(state): State<SharedState<S>>,
    Path(user_id): Path<i64>,
    _auth: AuthUser,
) -> Result<Json<MatchesResponse>, ApiError> {
    let matches = state.service.matches_for_user(user_id).await?;
    Ok(Json(MatchesResponse { user_id, matches }))
}

pub async fn ranked<S: AppStore>(
    State(state): State<SharedState<S>>,
    Path(user_id): Path<i64>,
    Query(query): Query<RankedQuery>,
    _auth: AuthUser,
) -> Result<Json<RankedMatchesResponse>, ApiError> {
    if query.min_score.is_some_and(|score| score > 100) {
        return Err(ApiError::BadRequest("min_score must be between 0 and 100".into()));
    }

    let min_score = query
        .min_score
        .unwrap_or(state.service.engine().config().min_compatibility_score);
    let matches = state
        .service
        .rank_matches(user_id, Some(min_score))
        .await?
        .ok_or_else(|| user_not_found(user_id))?;

    Ok(Json(RankedMatchesResponse {
        user_id,
        min_score,
        matches,
    }))
}

pub async fn score<S: AppStore>(
    State(state): State<SharedState<S>>,
    _auth: AuthUser,
    Json(request): Json<ScoreCandidateRequest>,
) -> Result<Json<ScoreCandidateResponse>, ApiError> {
    let outcome = state
        .service
        .score_candidate(request.user_id, request.candidate_id, request.activity_id)
        .await?;

    ScoreCandidateResponse::from_outcome(outcome)
        .map(Json)
        .ok_or_else(|| user_not_found(request.user_id))
}

pub async fn update_status<S: AppStore>(
    State(state): State<SharedState<S>>,
    Path(match_id): Path<i64>,
    _auth: AuthUser,
    Json(request): Json<MatchStatusRequest>,
) -> Result<Json<MatchRecord>, ApiError> {
    let decision = request
        .decision()
        .ok_or_else(|| ApiError::BadRequest("status must be connected or skipped".into()))?;

    let record = state
        .service
        .record_decision(match_id, decision)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("match {match_id} not found")))?;

    let label = match decision {
        MatchDecision::Connected => "connected",
        MatchDecision::Skipped => "skipped",
    };
    counter!(am_metrics::MATCH_DECISIONS, "decision" => label).increment(1);

    Ok(Json(record))
}
