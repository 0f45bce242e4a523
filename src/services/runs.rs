// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run orchestration.
//!
//! Ties together the lifecycle state machine, telemetry processing,
//! finalization and challenge evaluation:
//! 1. Create a run in `init`
//! 2. Start it (`init` → `in_progress`)
//! 3. Record positions while in progress
//! 4. Stop it (`in_progress` → `finished`), recompute aggregates and
//!    evaluate challenges for the athlete

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{ChallengeKind, Coordinate, Position, Run, RunStatus, RunSummary};
use crate::services::challenges::ChallengeEvaluator;
use crate::services::finalizer::{incremental_divergence, summarize};
use crate::services::lifecycle::{self, Transition};
use crate::services::telemetry::TelemetryProcessor;
use crate::services::validation::CoordinateValidator;
use crate::time_utils::now_rfc3339;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-run locks serializing position ingestion and lifecycle changes.
///
/// Entries exist only while a run can still change; finished runs drop
/// theirs.
pub type RunLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Result of stopping a run.
#[derive(Debug, Clone)]
pub struct StopOutcome {
    pub run: Run,
    /// Challenges newly granted by this stop
    pub granted: Vec<ChallengeKind>,
}

#[derive(Clone)]
pub struct RunService {
    db: Arc<dyn Store>,
    validator: CoordinateValidator,
    telemetry: TelemetryProcessor,
    challenges: ChallengeEvaluator,
    locks: RunLocks,
}

impl RunService {
    pub fn new(
        db: Arc<dyn Store>,
        validator: CoordinateValidator,
        telemetry: TelemetryProcessor,
        challenges: ChallengeEvaluator,
    ) -> Self {
        Self {
            db,
            validator,
            telemetry,
            challenges,
            locks: Arc::new(DashMap::new()),
        }
    }

    fn lock_for(&self, run_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(run_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Lock a run and read its state under the lock.
    ///
    /// Unknown runs fail before a lock entry is created. A run read as
    /// finished has its entry removed; the returned guard stays valid.
    async fn lock_run(&self, run_id: &str) -> Result<(OwnedMutexGuard<()>, Run)> {
        self.get_run(run_id).await?;

        let guard = self.lock_for(run_id).lock_owned().await;

        // Status may have changed while waiting for the lock
        let run = self.get_run(run_id).await?;
        if run.status == RunStatus::Finished {
            self.locks.remove(run_id);
        }
        Ok((guard, run))
    }

    /// Number of runs currently holding a lock entry.
    pub fn tracked_runs(&self) -> usize {
        self.locks.len()
    }

    /// Create a new run in `init` for an athlete.
    pub async fn create_run(&self, athlete_id: &str, comment: String) -> Result<Run> {
        let athlete = self
            .db
            .get_user(athlete_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Athlete {athlete_id} not found")))?;
        if !athlete.is_athlete() {
            return Err(AppError::Validation(format!(
                "User {athlete_id} is not an athlete"
            )));
        }

        let run = Run {
            id: uuid::Uuid::new_v4().to_string(),
            athlete_id: athlete.id,
            created_at: now_rfc3339(),
            comment,
            status: RunStatus::Init,
            distance: None,
            duration: None,
            average_speed: None,
        };
        self.db.insert_run(&run).await?;

        tracing::info!(run_id = %run.id, athlete_id = %run.athlete_id, "Run created");
        Ok(run)
    }

    pub async fn get_run(&self, run_id: &str) -> Result<Run> {
        self.db
            .get_run(run_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Run {run_id} not found")))
    }

    /// Runs ordered by creation time, optionally filtered.
    pub async fn list_runs(
        &self,
        athlete_id: Option<&str>,
        status: Option<RunStatus>,
    ) -> Result<Vec<Run>> {
        let runs = self.db.list_runs(athlete_id).await?;
        Ok(runs
            .into_iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect())
    }

    /// `init` → `in_progress`.
    pub async fn start(&self, run_id: &str) -> Result<Run> {
        let (_guard, mut run) = self.lock_run(run_id).await?;
        run.status = lifecycle::apply(run.status, Transition::Start)?;
        self.db.update_run(&run).await?;

        tracing::info!(run_id = %run.id, athlete_id = %run.athlete_id, "Run started");
        Ok(run)
    }

    /// `in_progress` → `finished`, then finalize and evaluate challenges.
    ///
    /// The finished status and aggregates are written before evaluation;
    /// an evaluation failure is logged and does not undo them.
    pub async fn stop(&self, run_id: &str) -> Result<StopOutcome> {
        let (_guard, mut run) = self.lock_run(run_id).await?;
        run.status = lifecycle::apply(run.status, Transition::Stop)?;

        let summary = self.finalize(&mut run).await?;
        self.locks.remove(run_id);

        tracing::info!(
            run_id = %run.id,
            athlete_id = %run.athlete_id,
            distance_km = summary.distance,
            duration_s = summary.duration,
            average_speed = summary.average_speed,
            "Run finished"
        );

        let granted = match self.challenges.evaluate(&run.athlete_id, &summary).await {
            Ok(granted) => granted,
            Err(e) => {
                tracing::error!(
                    run_id = %run.id,
                    athlete_id = %run.athlete_id,
                    error = %e,
                    "Challenge evaluation failed"
                );
                Vec::new()
            }
        };

        Ok(StopOutcome { run, granted })
    }

    /// Re-run finalization and evaluation for an already finished run.
    ///
    /// Overwrites the aggregates with the same values and grants nothing
    /// already held.
    pub async fn refinalize(&self, run_id: &str) -> Result<StopOutcome> {
        let (_guard, mut run) = self.lock_run(run_id).await?;
        if run.status != RunStatus::Finished {
            return Err(AppError::Conflict(format!("Run {run_id} is not finished")));
        }

        let summary = self.finalize(&mut run).await?;
        let granted = self.challenges.evaluate(&run.athlete_id, &summary).await?;

        tracing::debug!(run_id = %run.id, granted = granted.len(), "Run refinalized");
        Ok(StopOutcome { run, granted })
    }

    /// Recompute aggregates from stored positions and persist the run.
    async fn finalize(&self, run: &mut Run) -> Result<RunSummary> {
        let positions = self.db.positions_for_run(&run.id).await?;
        let summary = summarize(&positions);

        if let Some((incremental, delta)) = incremental_divergence(&positions, &summary) {
            tracing::warn!(
                run_id = %run.id,
                incremental_km = incremental,
                recomputed_km = summary.distance,
                delta_km = delta,
                "Incremental distance diverges from recomputed total"
            );
        }

        run.apply_summary(&summary);
        self.db.update_run(run).await?;
        Ok(summary)
    }

    /// Record a GPS point for an in-progress run.
    pub async fn submit_position(
        &self,
        run_id: &str,
        point: Coordinate,
        captured_at: DateTime<Utc>,
    ) -> Result<Position> {
        // Invalid coordinates are rejected before the run is touched
        self.validator.validate(point)?;

        let (_guard, run) = self.lock_run(run_id).await?;
        lifecycle::ensure_accepts_positions(run.status)?;

        self.telemetry.record(&run, point, captured_at).await
    }

    /// Positions ordered by capture time, optionally for a single run.
    pub async fn list_positions(&self, run_id: Option<&str>) -> Result<Vec<Position>> {
        self.db.list_positions(run_id).await
    }
}
