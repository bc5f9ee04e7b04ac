use axum::{Json, extract::State};

use am_common::{User, api::CompleteQuizRequest, quiz::PersonalityQuestion, store::ProfileWriter};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::{SharedState, store::AppStore};

pub async fn questions<S: AppStore>(
    State(state): State<SharedState<S>>,
    _auth: AuthUser,
) -> Result<Json<Vec<PersonalityQuestion>>, ApiError> {
    Ok(Json(state.service.store().personality_questions().await?))
}

pub async fn complete<S: AppStore>(
    State(state): State<SharedState<S>>,
    _auth: AuthUser,
    Json(request): Json<CompleteQuizRequest>,
) -> Result<Json<User>, ApiError> {
    if request.answers.is_empty() {
        return Err(ApiError::BadRequest("answers must not be empty".into()));
    }

    state
        .service
        .complete_quiz(request.user_id, request.answers)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", request.user_id)))
}
