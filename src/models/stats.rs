//! Athlete history aggregates used for challenge evaluation.
//!
//! Built fresh from the athlete's stored runs on every evaluation; never
//! cached across requests.

use crate::models::{Run, RunStatus};

/// Read-only snapshot of an athlete's running history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AthleteHistory {
    /// Runs with status `finished`
    pub finished_runs: u32,
    /// Sum of run distances in km (unfinalized runs count as 0)
    pub total_distance_km: f64,
}

impl AthleteHistory {
    /// Build a snapshot from a list of runs.
    pub fn from_runs<'a, I>(runs: I) -> Self
    where
        I: IntoIterator<Item = &'a Run>,
    {
        let mut history = Self::default();
        for run in runs {
            history.update_from_run(run);
        }
        history
    }

    /// Fold a run into the snapshot.
    pub fn update_from_run(&mut self, run: &Run) {
        if run.status == RunStatus::Finished {
            self.finished_runs += 1;
        }
        self.total_distance_km += run.distance.unwrap_or(0.0);
    }
}
