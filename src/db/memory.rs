// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store.
//!
//! Used for local development and tests. Uniqueness constraints are
//! enforced by the map keys, mirroring the deterministic document IDs of
//! the Firestore backend.

use crate::db::Store;
use crate::error::AppError;
use crate::models::{
    AthleteInfo, BoundingBox, Challenge, ChallengeKind, CollectibleItem, Position, Run,
    Subscription, User, UserRole,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    runs: HashMap<String, Run>,
    /// Insertion order; ties on capture time keep it
    positions: Vec<Position>,
    collectibles: BTreeMap<String, CollectibleItem>,
    challenges: BTreeMap<(String, ChallengeKind), Challenge>,
    subscriptions: BTreeMap<(String, String), Subscription>,
    athlete_info: HashMap<String, AthleteInfo>,
}

/// In-memory database.
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_positions<'a, I>(positions: I) -> Vec<Position>
where
    I: Iterator<Item = &'a Position>,
{
    let mut result: Vec<Position> = positions.cloned().collect();
    // Stable sort keeps insertion order for equal timestamps
    result.sort_by_key(|p| p.captured_at);
    result
}

#[async_trait]
impl Store for MemoryDb {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.tables.lock().await.users.get(user_id).cloned())
    }

    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>, AppError> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| {
            a.date_joined
                .cmp(&b.date_joined)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(users)
    }

    async fn insert_run(&self, run: &Run) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.runs.insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> Result<Option<Run>, AppError> {
        Ok(self.tables.lock().await.runs.get(run_id).cloned())
    }

    async fn update_run(&self, run: &Run) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        match tables.runs.get_mut(&run.id) {
            Some(stored) => {
                *stored = run.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Run {} not found", run.id))),
        }
    }

    async fn list_runs(&self, athlete_id: Option<&str>) -> Result<Vec<Run>, AppError> {
        let tables = self.tables.lock().await;
        let mut runs: Vec<Run> = tables
            .runs
            .values()
            .filter(|r| athlete_id.map_or(true, |a| r.athlete_id == a))
            .cloned()
            .collect();
        runs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(runs)
    }

    async fn insert_position(&self, position: &Position) -> Result<(), AppError> {
        self.tables.lock().await.positions.push(position.clone());
        Ok(())
    }

    async fn preceding_position(
        &self,
        run_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Position>, AppError> {
        let tables = self.tables.lock().await;
        let candidates = tables
            .positions
            .iter()
            .filter(|p| p.run_id == run_id && p.captured_at <= at);
        Ok(sorted_positions(candidates).pop())
    }

    async fn positions_for_run(&self, run_id: &str) -> Result<Vec<Position>, AppError> {
        let tables = self.tables.lock().await;
        Ok(sorted_positions(
            tables.positions.iter().filter(|p| p.run_id == run_id),
        ))
    }

    async fn list_positions(&self, run_id: Option<&str>) -> Result<Vec<Position>, AppError> {
        let tables = self.tables.lock().await;
        Ok(sorted_positions(
            tables
                .positions
                .iter()
                .filter(|p| run_id.map_or(true, |r| p.run_id == r)),
        ))
    }

    async fn insert_collectible(&self, item: &CollectibleItem) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.collectibles.contains_key(&item.uid) {
            return Ok(false);
        }
        tables.collectibles.insert(item.uid.clone(), item.clone());
        Ok(true)
    }

    async fn list_collectibles(&self) -> Result<Vec<CollectibleItem>, AppError> {
        Ok(self
            .tables
            .lock()
            .await
            .collectibles
            .values()
            .cloned()
            .collect())
    }

    async fn collectibles_in_box(
        &self,
        bbox: &BoundingBox,
    ) -> Result<Vec<CollectibleItem>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .collectibles
            .values()
            .filter(|item| bbox.contains(item.coordinate()))
            .cloned()
            .collect())
    }

    async fn add_collector(&self, uid: &str, athlete_id: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let item = tables
            .collectibles
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("Collectible item {uid} not found")))?;
        Ok(item.add_collector(athlete_id))
    }

    async fn insert_challenge(&self, challenge: &Challenge) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let key = (challenge.athlete_id.clone(), challenge.kind);
        if tables.challenges.contains_key(&key) {
            return Ok(false);
        }
        tables.challenges.insert(key, challenge.clone());
        Ok(true)
    }

    async fn list_challenges(
        &self,
        athlete_id: Option<&str>,
    ) -> Result<Vec<Challenge>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .challenges
            .values()
            .filter(|c| athlete_id.map_or(true, |a| c.athlete_id == a))
            .cloned()
            .collect())
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let key = (
            subscription.coach_id.clone(),
            subscription.athlete_id.clone(),
        );
        if tables.subscriptions.contains_key(&key) {
            return Ok(false);
        }
        tables.subscriptions.insert(key, subscription.clone());
        Ok(true)
    }

    async fn get_subscription(
        &self,
        coach_id: &str,
        athlete_id: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .subscriptions
            .get(&(coach_id.to_string(), athlete_id.to_string()))
            .cloned())
    }

    async fn update_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        let key = (
            subscription.coach_id.clone(),
            subscription.athlete_id.clone(),
        );
        match tables.subscriptions.get_mut(&key) {
            Some(stored) => {
                *stored = subscription.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Subscription not found".to_string())),
        }
    }

    async fn subscriptions_for_coach(
        &self,
        coach_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .subscriptions
            .values()
            .filter(|s| s.coach_id == coach_id)
            .cloned()
            .collect())
    }

    async fn get_athlete_info(&self, user_id: &str) -> Result<Option<AthleteInfo>, AppError> {
        Ok(self.tables.lock().await.athlete_info.get(user_id).cloned())
    }

    async fn upsert_athlete_info(&self, info: &AthleteInfo) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.athlete_info.insert(info.user_id.clone(), info.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn position(id: &str, run_id: &str, secs: i64) -> Position {
        Position {
            id: id.to_string(),
            run_id: run_id.to_string(),
            latitude: 10.0,
            longitude: 20.0,
            captured_at: Utc.timestamp_opt(secs, 0).unwrap(),
            speed: None,
            distance: None,
        }
    }

    #[tokio::test]
    async fn test_positions_ordered_by_capture_time() {
        let db = MemoryDb::new();
        db.insert_position(&position("p3", "r1", 30)).await.unwrap();
        db.insert_position(&position("p1", "r1", 10)).await.unwrap();
        db.insert_position(&position("other", "r2", 5)).await.unwrap();
        db.insert_position(&position("p2", "r1", 20)).await.unwrap();

        let ids: Vec<String> = db
            .positions_for_run("r1")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);

        let all = db.list_positions(None).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].id, "other");
    }

    #[tokio::test]
    async fn test_preceding_position_uses_timestamp_not_insertion() {
        let db = MemoryDb::new();
        db.insert_position(&position("late", "r1", 100)).await.unwrap();
        db.insert_position(&position("early", "r1", 10)).await.unwrap();

        let before_50 = db
            .preceding_position("r1", Utc.timestamp_opt(50, 0).unwrap())
            .await
            .unwrap();
        assert_eq!(before_50.unwrap().id, "early");

        let before_5 = db
            .preceding_position("r1", Utc.timestamp_opt(5, 0).unwrap())
            .await
            .unwrap();
        assert!(before_5.is_none());
    }

    #[tokio::test]
    async fn test_challenge_insert_is_unique() {
        let db = MemoryDb::new();
        let challenge = Challenge {
            athlete_id: "a1".to_string(),
            kind: ChallengeKind::TenRuns,
            granted_at: "2024-01-01T00:00:00Z".to_string(),
        };

        assert!(db.insert_challenge(&challenge).await.unwrap());
        assert!(!db.insert_challenge(&challenge).await.unwrap());
        assert_eq!(db.list_challenges(Some("a1")).await.unwrap().len(), 1);
        assert!(db.list_challenges(Some("a2")).await.unwrap().is_empty());
    }
}
