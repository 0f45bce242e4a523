// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and athlete info
//! - Runs and their positions (telemetry)
//! - Collectible items
//! - Challenges and coach subscriptions
//!
//! Pairs that must be unique are stored under deterministic document IDs
//! and written with create-only inserts, so Firestore itself rejects the
//! second writer.

use crate::db::{collections, Store};
use crate::error::AppError;
use crate::models::{
    AthleteInfo, BoundingBox, Challenge, CollectibleItem, Position, Run, Subscription, User,
    UserRole,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreQueryDirection};

/// Attempts at a contended collected-by update before giving up.
const COLLECT_ATTEMPTS: u32 = 5;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Fetch one document by ID.
    async fn get_doc<T>(&self, collection: &str, doc_id: &str) -> Result<Option<T>, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or overwrite one document.
    async fn set_doc<T>(&self, collection: &str, doc_id: &str, object: &T) -> Result<(), AppError>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Sync + Send,
    {
        let _: T = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Create a document only if its ID is free.
    ///
    /// Returns `false` if the document already exists.
    async fn create_doc<T>(
        &self,
        collection: &str,
        doc_id: &str,
        object: &T,
    ) -> Result<bool, AppError>
    where
        T: serde::Serialize + for<'de> serde::Deserialize<'de> + Sync + Send,
    {
        let result: Result<T, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(doc_id)
            .object(object)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// One read-modify-write of an item's collected-by set.
    ///
    /// The read goes through the transaction, so a concurrent writer makes
    /// the commit fail instead of being overwritten. Returns `None` when
    /// the commit failed and the caller should retry.
    async fn try_add_collector(
        &self,
        doc_id: &str,
        uid: &str,
        athlete_id: &str,
    ) -> Result<Option<bool>, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let in_transaction = client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );

        let current: Option<CollectibleItem> = in_transaction
            .fluent()
            .select()
            .by_id_in(collections::COLLECTIBLE_ITEMS)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read item in transaction: {}", e))
            })?;

        let Some(mut item) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Collectible item {uid} not found")));
        };

        if !item.add_collector(athlete_id) {
            let _ = transaction.rollback().await;
            return Ok(Some(false));
        }

        client
            .fluent()
            .update()
            .in_col(collections::COLLECTIBLE_ITEMS)
            .document_id(doc_id)
            .object(&item)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add item to transaction: {}", e))
            })?;

        match transaction.commit().await {
            Ok(_) => Ok(Some(true)),
            Err(e) => {
                tracing::debug!(uid, error = %e, "Collector transaction commit failed");
                Ok(None)
            }
        }
    }

    async fn query_positions(&self, run_id: Option<&str>) -> Result<Vec<Position>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POSITIONS);

        let query = if let Some(run_id) = run_id {
            let run_id = run_id.to_string();
            query.filter(move |q| q.field("run_id").eq(run_id.clone()))
        } else {
            query
        };

        query
            .order_by([("captured_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.set_doc(collections::USERS, &user.id, user).await
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_doc(collections::USERS, user_id).await
    }

    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>, AppError> {
        let query = self.get_client()?.fluent().select().from(collections::USERS);

        let query = if let Some(role) = role {
            let role = serde_json::to_value(role)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            query.filter(move |q| q.field("role").eq(role.clone()))
        } else {
            query
        };

        query
            .order_by([("date_joined", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Run Operations ──────────────────────────────────────────

    async fn insert_run(&self, run: &Run) -> Result<(), AppError> {
        self.set_doc(collections::RUNS, &run.id, run).await
    }

    async fn get_run(&self, run_id: &str) -> Result<Option<Run>, AppError> {
        self.get_doc(collections::RUNS, run_id).await
    }

    async fn update_run(&self, run: &Run) -> Result<(), AppError> {
        self.set_doc(collections::RUNS, &run.id, run).await
    }

    async fn list_runs(&self, athlete_id: Option<&str>) -> Result<Vec<Run>, AppError> {
        let query = self.get_client()?.fluent().select().from(collections::RUNS);

        let query = if let Some(athlete_id) = athlete_id {
            let athlete_id = athlete_id.to_string();
            query.filter(move |q| q.field("athlete_id").eq(athlete_id.clone()))
        } else {
            query
        };

        query
            .order_by([("created_at", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Position Operations ─────────────────────────────────────

    async fn insert_position(&self, position: &Position) -> Result<(), AppError> {
        self.set_doc(collections::POSITIONS, &position.id, position)
            .await
    }

    async fn preceding_position(
        &self,
        run_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Position>, AppError> {
        let run_id = run_id.to_string();
        let at_millis = at.timestamp_millis();

        let mut results: Vec<Position> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POSITIONS)
            .filter(move |q| {
                q.for_all([
                    q.field("run_id").eq(run_id.clone()),
                    q.field("captured_at").less_than_or_equal(at_millis),
                ])
            })
            .order_by([("captured_at", FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(results.pop())
    }

    async fn positions_for_run(&self, run_id: &str) -> Result<Vec<Position>, AppError> {
        self.query_positions(Some(run_id)).await
    }

    async fn list_positions(&self, run_id: Option<&str>) -> Result<Vec<Position>, AppError> {
        self.query_positions(run_id).await
    }

    // ─── Collectible Item Operations ─────────────────────────────

    async fn insert_collectible(&self, item: &CollectibleItem) -> Result<bool, AppError> {
        let doc_id = urlencoding::encode(&item.uid);
        self.create_doc(collections::COLLECTIBLE_ITEMS, &doc_id, item)
            .await
    }

    async fn list_collectibles(&self) -> Result<Vec<CollectibleItem>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COLLECTIBLE_ITEMS)
            .order_by([("uid", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn collectibles_in_box(
        &self,
        bbox: &BoundingBox,
    ) -> Result<Vec<CollectibleItem>, AppError> {
        let (min_lat, max_lat) = (bbox.min_latitude, bbox.max_latitude);

        // Range filter on one field server-side; longitude is checked here.
        let candidates: Vec<CollectibleItem> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COLLECTIBLE_ITEMS)
            .filter(move |q| {
                q.for_all([
                    q.field("latitude").greater_than_or_equal(min_lat),
                    q.field("latitude").less_than_or_equal(max_lat),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(candidates
            .into_iter()
            .filter(|item| bbox.contains(item.coordinate()))
            .collect())
    }

    async fn add_collector(&self, uid: &str, athlete_id: &str) -> Result<bool, AppError> {
        let doc_id = urlencoding::encode(uid).into_owned();

        for attempt in 1..=COLLECT_ATTEMPTS {
            match self.try_add_collector(&doc_id, uid, athlete_id).await? {
                Some(added) => return Ok(added),
                None => tracing::debug!(
                    uid,
                    athlete_id,
                    attempt,
                    "Collector update contended, retrying"
                ),
            }
        }

        Err(AppError::Database(format!(
            "Collector update for item {uid} did not commit after {COLLECT_ATTEMPTS} attempts"
        )))
    }

    // ─── Challenge Operations ────────────────────────────────────

    async fn insert_challenge(&self, challenge: &Challenge) -> Result<bool, AppError> {
        self.create_doc(collections::CHALLENGES, &challenge.document_id(), challenge)
            .await
    }

    async fn list_challenges(
        &self,
        athlete_id: Option<&str>,
    ) -> Result<Vec<Challenge>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CHALLENGES);

        let query = if let Some(athlete_id) = athlete_id {
            let athlete_id = athlete_id.to_string();
            query.filter(move |q| q.field("athlete_id").eq(athlete_id.clone()))
        } else {
            query
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Coaching Operations ─────────────────────────────────────

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<bool, AppError> {
        self.create_doc(
            collections::SUBSCRIPTIONS,
            &subscription.document_id(),
            subscription,
        )
        .await
    }

    async fn get_subscription(
        &self,
        coach_id: &str,
        athlete_id: &str,
    ) -> Result<Option<Subscription>, AppError> {
        let doc_id = format!(
            "{}_{}",
            urlencoding::encode(coach_id),
            urlencoding::encode(athlete_id)
        );
        self.get_doc(collections::SUBSCRIPTIONS, &doc_id).await
    }

    async fn update_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        self.set_doc(
            collections::SUBSCRIPTIONS,
            &subscription.document_id(),
            subscription,
        )
        .await
    }

    async fn subscriptions_for_coach(
        &self,
        coach_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let coach_id = coach_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBSCRIPTIONS)
            .filter(move |q| q.field("coach_id").eq(coach_id.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn get_athlete_info(&self, user_id: &str) -> Result<Option<AthleteInfo>, AppError> {
        self.get_doc(collections::ATHLETE_INFO, user_id).await
    }

    async fn upsert_athlete_info(&self, info: &AthleteInfo) -> Result<(), AppError> {
        self.set_doc(collections::ATHLETE_INFO, &info.user_id, info)
            .await
    }
}
