// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod challenges;
pub mod coaching;
pub mod collectibles;
pub mod finalizer;
pub mod geo;
pub mod lifecycle;
pub mod runs;
pub mod telemetry;
pub mod users;
pub mod validation;

pub use challenges::{ChallengeEvaluator, ChallengeRules};
pub use coaching::{AthleteInfoUpdate, CoachingService};
pub use collectibles::{CollectibleService, ImportReport, RejectedRow};
pub use runs::{RunLocks, RunService, StopOutcome};
pub use telemetry::TelemetryProcessor;
pub use users::{NewUser, UserService};
pub use validation::{CoordinateError, CoordinateValidator};
