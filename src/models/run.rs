// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run model: one athlete's tracked running session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a run. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Init,
    InProgress,
    Finished,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Init => "init",
            RunStatus::InProgress => "in_progress",
            RunStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored run record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Run ID (also used as document ID)
    pub id: String,
    /// Owning athlete's user ID
    pub athlete_id: String,
    /// When the run was created (ISO 8601)
    pub created_at: String,
    #[serde(default)]
    pub comment: String,
    pub status: RunStatus,
    /// Total distance in km, set on finalization
    pub distance: Option<f64>,
    /// Elapsed time in whole seconds, set on finalization
    pub duration: Option<i64>,
    /// Mean of per-point speeds (m/s), set on finalization
    pub average_speed: Option<f64>,
}

impl Run {
    /// Write finalized aggregates onto the run.
    pub fn apply_summary(&mut self, summary: &RunSummary) {
        self.distance = Some(summary.distance);
        self.duration = Some(summary.duration);
        self.average_speed = Some(summary.average_speed);
    }

    /// The stored aggregates, if the run has been finalized.
    pub fn summary(&self) -> Option<RunSummary> {
        Some(RunSummary {
            distance: self.distance?,
            duration: self.duration?,
            average_speed: self.average_speed?,
        })
    }
}

/// Aggregate statistics computed when a run is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Kilometers, 3 decimals
    pub distance: f64,
    /// Seconds between first and last point
    pub duration: i64,
    /// Meters per second, 2 decimals
    pub average_speed: f64,
}
