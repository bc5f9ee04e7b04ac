use am_common::store::InMemoryStore;
use am_common::{
    Activity, AvailabilitySlot, DayOfWeek, PersonalityTraits, SkillLevel, TimeSlot, User,
};
use axum::{Router, body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const KEY: &str = "flow-key";

fn user(id: i64, quiz_completed: bool) -> User {
    User {
        id,
        username: format!("user{id}"),
        name: format!("User {id}"),
        personality_traits: Some(PersonalityTraits::new(80, 70, 50, 60, 90)),
        quiz_completed,
        ..User::default()
    }
}

fn hike(id: i64, user_id: i64) -> Activity {
    Activity {
        id,
        user_id,
        name: format!("Hike {id}"),
        category: "Outdoor".into(),
        skill_level: SkillLevel::All,
        is_active: true,
        ..Activity::default()
    }
}

fn friday(user_id: i64) -> AvailabilitySlot {
    AvailabilitySlot {
        user_id,
        day_of_week: DayOfWeek::Friday,
        time_slot: TimeSlot::Evening,
        is_available: true,
    }
}

fn app() -> Router {
    let store = InMemoryStore::new()
        .with_user(user(1, true))
        .with_user(user(2, true))
        .with_activity(hike(10, 1))
        .with_activity(hike(20, 2))
        .with_slot(friday(1))
        .with_slot(friday(2));

    am_api::create_router(am_api::memory_state(KEY, store))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", KEY)
        .header("content-type", "application/json");
    let body = body.map_or_else(Body::empty, |value| Body::from(value.to_string()));

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn generate_then_decide() {
    let app = app();

    let (status, body) = call(&app, "POST", "/api/matches/generate", Some(json!({"user_id": 1}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "matched");
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["matched_user_id"], 2);
    assert_eq!(matches[0]["status"], "pending");
    let match_id = matches[0]["id"].as_i64().unwrap();

    let uri = format!("/api/matches/{match_id}/status");
    let (status, _) = call(&app, "PATCH", &uri, Some(json!({"status": "pending"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, "PATCH", &uri, Some(json!({"status": "connected"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "connected");

    let (status, body) = call(&app, "GET", "/api/users/1/matches", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matches"][0]["status"], "connected");

    let (status, _) = call(&app, "PATCH", "/api/matches/999/status", Some(json!({"status": "skipped"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generate_for_unknown_user_is_not_found() {
    let app = app();
    let (status, body) = call(&app, "POST", "/api/matches/generate", Some(json!({"user_id": 42}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn ranked_and_score() {
    let app = app();

    let (status, body) = call(&app, "GET", "/api/users/1/ranked?min_score=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["min_score"], 0);
    let ranked = body["matches"].as_array().unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0]["candidate_user_id"], 2);

    let (status, _) = call(&app, "GET", "/api/users/1/ranked?min_score=101", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        "POST",
        "/api/matches/score",
        Some(json!({"user_id": 1, "candidate_id": 2, "activity_id": 20})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "scored");
    assert_eq!(body["result"]["activity_id"], 20);

    let (status, body) = call(
        &app,
        "POST",
        "/api/matches/score",
        Some(json!({"user_id": 1, "candidate_id": 2, "activity_id": 999})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "not_applicable");
}

#[tokio::test]
async fn profile_updates() {
    let app = app();

    let (status, _) = call(
        &app,
        "PUT",
        "/api/users/1/availability",
        Some(json!([
            {"day_of_week": "monday", "time_slot": "morning"},
            {"day_of_week": "monday", "time_slot": "morning"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        "PUT",
        "/api/users/1/availability",
        Some(json!([{"day_of_week": "monday", "time_slot": "morning"}])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = call(&app, "GET", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["availability"][0]["day_of_week"], "monday");

    let (status, _) = call(&app, "GET", "/api/users/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
