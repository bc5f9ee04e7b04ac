use am_common::store::InMemoryStore;
use axum::{body::Body, http::Request, http::StatusCode};
use std::sync::atomic::Ordering;
use tower::ServiceExt;

async fn readyz_status(ready: bool) -> StatusCode {
    let state = am_api::memory_state("test-key", InMemoryStore::new());
    state.readiness.store(ready, Ordering::SeqCst);
    let app = am_api::create_router(state);

    app.oneshot(
        Request::builder()
            .uri("/readyz")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

#[tokio::test]
async fn readyz_returns_service_unavailable_when_draining() {
    assert_eq!(readyz_status(false).await, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn readyz_ok_when_store_answers() {
    assert_eq!(readyz_status(true).await, StatusCode::OK);
}
