// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use run_tracker::config::Config;
use run_tracker::db::{FirestoreDb, MemoryDb, Store};
use run_tracker::models::{User, UserRole};
use run_tracker::routes::create_router;
use run_tracker::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by in-memory storage.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    let db: Arc<dyn Store> = Arc::new(MemoryDb::new());
    let state = Arc::new(AppState::new(Config::test_default(), db));
    (create_router(state.clone()), state)
}

/// Insert a user directly into storage.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, id: &str, role: UserRole) -> User {
    let user = User {
        id: id.to_string(),
        username: id.to_string(),
        first_name: "Test".to_string(),
        last_name: id.to_string(),
        role,
        date_joined: "2024-01-01T00:00:00.000Z".to_string(),
    };
    state.db.insert_user(&user).await.unwrap();
    user
}

/// Send a request and decode the JSON response body.
#[allow(dead_code)]
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Create a run for `athlete_id` and start it; returns the run ID.
#[allow(dead_code)]
pub async fn started_run(app: &Router, athlete_id: &str) -> String {
    let (status, run) = send(
        app,
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "athlete_id": athlete_id, "comment": "test" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{run}");
    let run_id = run["id"].as_str().unwrap().to_string();

    let (status, _) = send(app, "POST", &format!("/api/runs/{run_id}/start"), None).await;
    assert_eq!(status, StatusCode::OK);
    run_id
}

/// Submit a position; returns the status and body.
#[allow(dead_code)]
pub async fn submit(
    app: &Router,
    run_id: &str,
    latitude: f64,
    longitude: f64,
    date_time: &str,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/positions",
        Some(serde_json::json!({
            "run": run_id,
            "latitude": latitude,
            "longitude": longitude,
            "date_time": date_time,
        })),
    )
    .await
}
