use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, State},
};

use am_common::{
    AvailabilitySlot, Resources, UserProfile,
    api::{AvailabilitySlotInput, ResourcesRequest},
    store::{ProfileSource, ProfileWriter},
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::{SharedState, store::AppStore};

pub async fn get_profile<S: AppStore>(
    State(state): State<SharedState<S>>,
    Path(user_id): Path<i64>,
    _auth: AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    state
        .service
        .store()
        .user_with_details(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))
}

pub async fn put_availability<S: AppStore>(
    State(state): State<SharedState<S>>,
    Path(user_id): Path<i64>,
    _auth: AuthUser,
    Json(slots): Json<Vec<AvailabilitySlotInput>>,
) -> Result<Json<Vec<AvailabilitySlot>>, ApiError> {
    let slots: Vec<AvailabilitySlot> = slots
        .into_iter()
        .map(|input| input.into_slot(user_id))
        .collect();

    let mut seen = HashSet::new();
    if let Some(dup) = slots.iter().find(|slot| !seen.insert(slot.key())) {
        return Err(ApiError::BadRequest(format!(
            "duplicate slot {} {}",
            dup.day_of_week.as_ref(),
            dup.time_slot.as_ref()
        )));
    }

    state
        .service
        .store()
        .replace_availability(user_id, slots)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))
}

pub async fn put_resources<S: AppStore>(
    State(state): State<SharedState<S>>,
    Path(user_id): Path<i64>,
    _auth: AuthUser,
    Json(request): Json<ResourcesRequest>,
) -> Result<Json<Resources>, ApiError> {
    request
        .validate()
        .map_err(|msg| ApiError::BadRequest(msg.into()))?;

    state
        .service
        .store()
        .upsert_resources(user_id, request.into_resources(user_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))
}
