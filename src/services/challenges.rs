// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge rules and their evaluation after a run finishes.

use crate::config::ChallengeThresholds;
use crate::db::Store;
use crate::error::Result;
use crate::models::{AthleteHistory, Challenge, ChallengeKind, RunSummary, User};
use crate::time_utils::now_rfc3339;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// The fixed rule set, parameterized by thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChallengeRules {
    thresholds: ChallengeThresholds,
}

impl ChallengeRules {
    pub fn new(thresholds: ChallengeThresholds) -> Self {
        Self { thresholds }
    }

    /// Whether `kind` is earned given the athlete's history and the run
    /// that was just finalized.
    pub fn is_satisfied(
        &self,
        kind: ChallengeKind,
        history: &AthleteHistory,
        finished: &RunSummary,
    ) -> bool {
        let t = &self.thresholds;
        match kind {
            ChallengeKind::TenRuns => history.finished_runs >= t.ten_runs_count,
            ChallengeKind::FiftyKm => history.total_distance_km >= t.fifty_km_total_km,
            ChallengeKind::Fast2Km => {
                finished.distance >= t.fast_run_min_km
                    && finished.duration <= t.fast_run_max_seconds
            }
        }
    }

    /// All satisfied challenges, in evaluation order.
    pub fn satisfied(
        &self,
        history: &AthleteHistory,
        finished: &RunSummary,
    ) -> Vec<ChallengeKind> {
        ChallengeKind::ALL
            .into_iter()
            .filter(|&kind| self.is_satisfied(kind, history, finished))
            .collect()
    }
}

/// Grants challenges against the stored history.
#[derive(Clone)]
pub struct ChallengeEvaluator {
    db: Arc<dyn Store>,
    rules: ChallengeRules,
}

impl ChallengeEvaluator {
    pub fn new(db: Arc<dyn Store>, rules: ChallengeRules) -> Self {
        Self { db, rules }
    }

    /// Evaluate every rule for an athlete after `finished` was finalized.
    ///
    /// Returns the challenges newly granted by this call. Already-held
    /// challenges are skipped, and a grant that loses a race to a
    /// concurrent writer is a no-op.
    pub async fn evaluate(
        &self,
        athlete_id: &str,
        finished: &RunSummary,
    ) -> Result<Vec<ChallengeKind>> {
        let runs = self.db.list_runs(Some(athlete_id)).await?;
        let history = AthleteHistory::from_runs(&runs);

        let held: BTreeSet<ChallengeKind> = self
            .db
            .list_challenges(Some(athlete_id))
            .await?
            .into_iter()
            .map(|c| c.kind)
            .collect();

        let mut granted = Vec::new();
        for kind in self.rules.satisfied(&history, finished) {
            if held.contains(&kind) {
                continue;
            }

            let challenge = Challenge {
                athlete_id: athlete_id.to_string(),
                kind,
                granted_at: now_rfc3339(),
            };

            if self.db.insert_challenge(&challenge).await? {
                tracing::info!(
                    athlete_id = %athlete_id,
                    challenge = kind.key(),
                    finished_runs = history.finished_runs,
                    total_km = history.total_distance_km,
                    "Challenge granted"
                );
                granted.push(kind);
            } else {
                tracing::debug!(
                    athlete_id = %athlete_id,
                    challenge = kind.key(),
                    "Challenge already granted concurrently"
                );
            }
        }

        Ok(granted)
    }

    /// Granted challenges, optionally for one athlete.
    pub async fn list(&self, athlete_id: Option<&str>) -> Result<Vec<Challenge>> {
        self.db.list_challenges(athlete_id).await
    }

    /// Holders of each challenge, grouped by challenge.
    ///
    /// Only challenges held by at least one athlete appear.
    pub async fn summary(&self) -> Result<Vec<(ChallengeKind, Vec<User>)>> {
        let mut groups: BTreeMap<ChallengeKind, Vec<User>> = BTreeMap::new();

        for challenge in self.db.list_challenges(None).await? {
            match self.db.get_user(&challenge.athlete_id).await? {
                Some(user) => groups.entry(challenge.kind).or_default().push(user),
                None => tracing::warn!(
                    athlete_id = %challenge.athlete_id,
                    challenge = challenge.kind.key(),
                    "Challenge holder no longer exists"
                ),
            }
        }

        for holders in groups.values_mut() {
            holders.sort_by(|a, b| a.username.cmp(&b.username));
        }

        Ok(groups.into_iter().collect())
    }
}
