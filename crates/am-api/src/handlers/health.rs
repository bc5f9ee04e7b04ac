use std::sync::atomic::Ordering;

use axum::{Json, extract::State};
use serde_json::json;
use tokio::time::{Duration, timeout};

use crate::error::ApiError;
use crate::{SharedState, store::AppStore};

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// 503 while draining or when the store does not answer within a second.
pub async fn readyz<S: AppStore>(
    State(state): State<SharedState<S>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.readiness.load(Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    timeout(READINESS_TIMEOUT, state.service.store().ping())
        .await
        .map_err(|_| ApiError::ServiceUnavailable("db_ping_timeout".into()))?
        .map_err(|err| ApiError::ServiceUnavailable(format!("health check failed: {err}")))?;

    Ok(Json(json!({
        "status": "ok",
        "database": "ok",
        "application": env!("CARGO_PKG_NAME"),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_common::store::InMemoryStore;

    #[tokio::test]
    async fn readyz_rejects_when_draining() {
        let state = crate::memory_state("test-key", InMemoryStore::new());
        state.readiness.store(false, Ordering::SeqCst);

        match readyz(State(state)).await {
            Err(ApiError::ServiceUnavailable(code)) => assert!(code.contains("shutting_down")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn readyz_ok_when_store_answers() {
        let state = crate::memory_state("test-key", InMemoryStore::new());
        let Json(body) = readyz(State(state)).await.unwrap();
        assert_eq!(body["database"], "ok");
    }
}
