// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge grants triggered by stopping runs.

use axum::{http::StatusCode, Router};
use run_tracker::models::{Run, RunStatus, UserRole};
use serde_json::{json, Value};

mod common;
use common::{create_test_app, seed_user, send, started_run, submit};

/// Start and stop a run with the given (latitude, seconds) points along the
/// equator; returns the stop response.
async fn finish_run(app: &Router, athlete_id: &str, points: &[(f64, u32)]) -> Value {
    let run_id = started_run(app, athlete_id).await;
    for &(lat, secs) in points {
        let date_time = format!("2024-05-01T10:{:02}:{:02}Z", secs / 60, secs % 60);
        let (status, body) = submit(app, &run_id, lat, 0.0, &date_time).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }
    let (status, stopped) = send(app, "POST", &format!("/api/runs/{run_id}/stop"), None).await;
    assert_eq!(status, StatusCode::OK, "{stopped}");
    stopped
}

fn finished_run(id: &str, athlete_id: &str, distance: f64) -> Run {
    Run {
        id: id.to_string(),
        athlete_id: athlete_id.to_string(),
        created_at: "2024-01-01T00:00:00.000Z".to_string(),
        comment: String::new(),
        status: RunStatus::Finished,
        distance: Some(distance),
        duration: Some(3600),
        average_speed: Some(2.0),
    }
}

#[tokio::test]
async fn test_tenth_run_grants_ten_runs_once() {
    let (app, state) = create_test_app();
    seed_user(&state, "athlete", UserRole::Athlete).await;

    for i in 1..=9 {
        let stopped = finish_run(&app, "athlete", &[]).await;
        assert_eq!(stopped["granted_challenges"], json!([]), "run {i}");
    }

    let tenth = finish_run(&app, "athlete", &[]).await;
    assert_eq!(tenth["granted_challenges"], json!(["Complete 10 runs!"]));

    let eleventh = finish_run(&app, "athlete", &[]).await;
    assert_eq!(eleventh["granted_challenges"], json!([]));

    let (_, challenges) = send(&app, "GET", "/api/challenges?athlete=athlete", None).await;
    let challenges = challenges.as_array().unwrap();
    assert_eq!(challenges.len(), 1);
    assert_eq!(challenges[0]["key"], "ten_runs");
}

#[tokio::test]
async fn test_crossing_fifty_km_grants_once() {
    let (app, state) = create_test_app();
    seed_user(&state, "athlete", UserRole::Athlete).await;
    state
        .db
        .insert_run(&finished_run("history", "athlete", 49.9))
        .await
        .unwrap();

    // ~0.299 km in two minutes
    let stopped = finish_run(&app, "athlete", &[(0.0, 0), (0.0027, 120)]).await;
    assert_eq!(stopped["distance"], 0.299);
    assert_eq!(stopped["granted_challenges"], json!(["Run 50 km in total!"]));

    let again = finish_run(&app, "athlete", &[(0.0, 0), (0.0027, 120)]).await;
    assert_eq!(again["granted_challenges"], json!([]));

    let (_, challenges) = send(&app, "GET", "/api/challenges?athlete=athlete", None).await;
    assert_eq!(challenges.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fast_2km_depends_on_duration() {
    let (app, state) = create_test_app();
    seed_user(&state, "quick", UserRole::Athlete).await;
    seed_user(&state, "steady", UserRole::Athlete).await;

    // ~2.51 km
    let fast = finish_run(&app, "quick", &[(0.0, 0), (0.0113, 240), (0.0227, 480)]).await;
    assert_eq!(fast["duration"], 480);
    assert_eq!(
        fast["granted_challenges"],
        json!(["2 km in under 10 minutes!"])
    );

    let slow = finish_run(&app, "steady", &[(0.0, 0), (0.0113, 350), (0.0227, 700)]).await;
    assert_eq!(slow["duration"], 700);
    assert_eq!(slow["granted_challenges"], json!([]));
}

#[tokio::test]
async fn test_rules_can_fire_together() {
    let (app, state) = create_test_app();
    seed_user(&state, "athlete", UserRole::Athlete).await;
    for i in 0..9 {
        state
            .db
            .insert_run(&finished_run(&format!("past-{i}"), "athlete", 5.5))
            .await
            .unwrap();
    }

    let stopped = finish_run(&app, "athlete", &[(0.0, 0), (0.0227, 480)]).await;

    assert_eq!(
        stopped["granted_challenges"],
        json!([
            "Complete 10 runs!",
            "Run 50 km in total!",
            "2 km in under 10 minutes!"
        ])
    );
}

#[tokio::test]
async fn test_refinalize_is_idempotent() {
    let (app, state) = create_test_app();
    seed_user(&state, "athlete", UserRole::Athlete).await;

    let stopped = finish_run(&app, "athlete", &[(0.0, 0), (0.0113, 240), (0.0227, 480)]).await;
    let run_id = stopped["id"].as_str().unwrap();
    let before = state.runs.get_run(run_id).await.unwrap();

    for _ in 0..2 {
        let outcome = state.runs.refinalize(run_id).await.unwrap();
        assert!(outcome.granted.is_empty());
        assert_eq!(outcome.run.summary(), before.summary());
    }

    let after = state.runs.get_run(run_id).await.unwrap();
    assert_eq!(after.summary(), before.summary());
    assert_eq!(after.status, RunStatus::Finished);
    assert_eq!(state.challenges.list(Some("athlete")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_refinalize_requires_finished_run() {
    let (app, state) = create_test_app();
    seed_user(&state, "athlete", UserRole::Athlete).await;
    let run_id = started_run(&app, "athlete").await;

    let result = state.runs.refinalize(&run_id).await;
    assert!(matches!(
        result,
        Err(run_tracker::error::AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn test_challenges_summary_groups_holders() {
    let (app, state) = create_test_app();
    seed_user(&state, "ada", UserRole::Athlete).await;
    seed_user(&state, "bob", UserRole::Athlete).await;
    seed_user(&state, "cy", UserRole::Athlete).await;

    finish_run(&app, "bob", &[(0.0, 0), (0.0227, 480)]).await;
    finish_run(&app, "ada", &[(0.0, 0), (0.0227, 480)]).await;
    state
        .db
        .insert_run(&finished_run("long", "cy", 60.0))
        .await
        .unwrap();
    finish_run(&app, "cy", &[]).await;

    let (status, summary) = send(&app, "GET", "/api/challenges_summary", None).await;
    assert_eq!(status, StatusCode::OK);

    let groups = summary.as_array().unwrap();
    assert_eq!(groups.len(), 2);

    assert_eq!(groups[0]["key"], "fifty_km");
    assert_eq!(groups[0]["name"], "Run 50 km in total!");
    assert_eq!(
        groups[0]["athletes"],
        json!([{ "id": "cy", "full_name": "Test cy" }])
    );

    assert_eq!(groups[1]["key"], "fast_2km");
    let holders: Vec<&str> = groups[1]["athletes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(holders, vec!["ada", "bob"]);
}
