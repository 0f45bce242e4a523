// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run lifecycle state machine: `init` → `in_progress` → `finished`.

use crate::models::RunStatus;

/// A requested lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Stop,
}

/// Illegal transition for the run's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RunStateError {
    #[error("Run has already been started")]
    AlreadyStarted,

    #[error("Run has already been finished")]
    AlreadyFinished,

    #[error("Run has not been started")]
    NotStarted,

    #[error("Run is not in progress")]
    NotInProgress,
}

/// Compute the status after `transition`, or why it is illegal.
pub fn apply(from: RunStatus, transition: Transition) -> Result<RunStatus, RunStateError> {
    match (from, transition) {
        (RunStatus::Init, Transition::Start) => Ok(RunStatus::InProgress),
        (RunStatus::InProgress, Transition::Start) => Err(RunStateError::AlreadyStarted),
        (RunStatus::InProgress, Transition::Stop) => Ok(RunStatus::Finished),
        (RunStatus::Init, Transition::Stop) => Err(RunStateError::NotStarted),
        (RunStatus::Finished, _) => Err(RunStateError::AlreadyFinished),
    }
}

/// Positions may only be recorded while the run is in progress.
pub fn ensure_accepts_positions(status: RunStatus) -> Result<(), RunStateError> {
    if status == RunStatus::InProgress {
        Ok(())
    } else {
        Err(RunStateError::NotInProgress)
    }
}
