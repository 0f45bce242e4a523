// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod challenge;
pub mod coaching;
pub mod collectible;
pub mod position;
pub mod run;
pub mod stats;
pub mod user;

pub use challenge::{Challenge, ChallengeKind};
pub use coaching::{AthleteInfo, Subscription};
pub use collectible::{BoundingBox, CollectibleItem};
pub use position::{Coordinate, Position};
pub use run::{Run, RunStatus, RunSummary};
pub use stats::AthleteHistory;
pub use user::{User, UserRole};
