// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set). They are skipped otherwise.

use chrono::{TimeZone, Utc};
use run_tracker::db::Store;
use run_tracker::models::{
    AthleteInfo, BoundingBox, Challenge, ChallengeKind, CollectibleItem, Coordinate, Position, Run,
    RunStatus, Subscription,
};

mod common;
use common::test_db;

/// Generate a unique ID for test isolation.
fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

fn position(run_id: &str, secs: i64, lat: f64) -> Position {
    Position {
        id: unique_id("pos"),
        run_id: run_id.to_string(),
        latitude: lat,
        longitude: 0.0,
        captured_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        speed: Some(0.0),
        distance: Some(0.0),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// RUN TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_run_roundtrip_and_update() {
    require_emulator!();

    let db = test_db().await;
    let athlete_id = unique_id("athlete");
    let mut run = Run {
        id: unique_id("run"),
        athlete_id: athlete_id.clone(),
        created_at: "2024-01-15T10:00:00.000Z".to_string(),
        comment: "tempo".to_string(),
        status: RunStatus::Init,
        distance: None,
        duration: None,
        average_speed: None,
    };
    db.insert_run(&run).await.unwrap();

    run.status = RunStatus::Finished;
    run.distance = Some(5.123);
    run.duration = Some(1500);
    run.average_speed = Some(3.41);
    db.update_run(&run).await.unwrap();

    let fetched = db.get_run(&run.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, RunStatus::Finished);
    assert_eq!(fetched.summary(), run.summary());

    let runs = db.list_runs(Some(&athlete_id)).await.unwrap();
    assert_eq!(runs.len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// POSITION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_positions_ordered_by_capture_time() {
    require_emulator!();

    let db = test_db().await;
    let run_id = unique_id("run");

    for (secs, lat) in [(30, 0.003), (10, 0.001), (20, 0.002)] {
        db.insert_position(&position(&run_id, secs, lat)).await.unwrap();
    }

    let positions = db.positions_for_run(&run_id).await.unwrap();
    let lats: Vec<f64> = positions.iter().map(|p| p.latitude).collect();
    assert_eq!(lats, vec![0.001, 0.002, 0.003]);

    let preceding = db
        .preceding_position(&run_id, Utc.timestamp_opt(1_700_000_025, 0).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(preceding.latitude, 0.002);

    let none = db
        .preceding_position(&run_id, Utc.timestamp_opt(1_700_000_005, 0).unwrap())
        .await
        .unwrap();
    assert!(none.is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// UNIQUENESS TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_challenge_granted_once() {
    require_emulator!();

    let db = test_db().await;
    let challenge = Challenge {
        athlete_id: unique_id("athlete"),
        kind: ChallengeKind::FiftyKm,
        granted_at: "2024-01-15T10:00:00.000Z".to_string(),
    };

    assert!(db.insert_challenge(&challenge).await.unwrap());
    assert!(!db.insert_challenge(&challenge).await.unwrap());

    let held = db
        .list_challenges(Some(&challenge.athlete_id))
        .await
        .unwrap();
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].kind, ChallengeKind::FiftyKm);
}

#[tokio::test]
async fn test_subscription_pair_unique() {
    require_emulator!();

    let db = test_db().await;
    let subscription = Subscription {
        coach_id: unique_id("coach"),
        athlete_id: unique_id("athlete"),
        rating: None,
        created_at: "2024-01-15T10:00:00.000Z".to_string(),
    };

    assert!(db.insert_subscription(&subscription).await.unwrap());
    assert!(!db.insert_subscription(&subscription).await.unwrap());

    let rated = Subscription {
        rating: Some(4),
        ..subscription.clone()
    };
    db.update_subscription(&rated).await.unwrap();

    let stored = db
        .get_subscription(&subscription.coach_id, &subscription.athlete_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.rating, Some(4));
}

#[tokio::test]
async fn test_athlete_info_upsert() {
    require_emulator!();

    let db = test_db().await;
    let info = AthleteInfo {
        user_id: unique_id("athlete"),
        goals: "Sub-4 marathon".to_string(),
        weight: Some(70),
    };

    db.upsert_athlete_info(&info).await.unwrap();
    db.upsert_athlete_info(&AthleteInfo {
        weight: Some(68),
        ..info.clone()
    })
    .await
    .unwrap();

    let stored = db.get_athlete_info(&info.user_id).await.unwrap().unwrap();
    assert_eq!(stored.goals, "Sub-4 marathon");
    assert_eq!(stored.weight, Some(68));
}

#[tokio::test]
async fn test_collectible_uid_unique_and_collect_idempotent() {
    require_emulator!();

    let db = test_db().await;
    let lat = 45.1234;
    let item = CollectibleItem {
        uid: unique_id("item"),
        name: "Bench".to_string(),
        latitude: lat,
        longitude: 7.5,
        picture: "https://example.com/bench.png".to_string(),
        value: 5,
        collected_by: vec![],
    };

    assert!(db.insert_collectible(&item).await.unwrap());
    assert!(!db.insert_collectible(&item).await.unwrap());

    let bbox = BoundingBox::around(Coordinate::new(lat, 7.5), 0.001);
    let found = db.collectibles_in_box(&bbox).await.unwrap();
    assert!(found.iter().any(|i| i.uid == item.uid));

    assert!(db.add_collector(&item.uid, "athlete-x").await.unwrap());
    assert!(!db.add_collector(&item.uid, "athlete-x").await.unwrap());
}

#[tokio::test]
async fn test_concurrent_collectors_are_all_kept() {
    require_emulator!();

    let db = std::sync::Arc::new(test_db().await);
    let item = CollectibleItem {
        uid: unique_id("item"),
        name: "Statue".to_string(),
        latitude: 45.2,
        longitude: 7.6,
        picture: "https://example.com/statue.png".to_string(),
        value: 5,
        collected_by: vec![],
    };
    assert!(db.insert_collectible(&item).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..4 {
        let db = db.clone();
        let uid = item.uid.clone();
        handles.push(tokio::spawn(async move {
            db.add_collector(&uid, &format!("athlete-{i}")).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    let stored = db
        .list_collectibles()
        .await
        .unwrap()
        .into_iter()
        .find(|i| i.uid == item.uid)
        .unwrap();
    let mut collectors = stored.collected_by;
    collectors.sort();
    assert_eq!(
        collectors,
        vec!["athlete-0", "athlete-1", "athlete-2", "athlete-3"]
    );
}
