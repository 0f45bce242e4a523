// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run Tracker: GPS run telemetry and achievements
//!
//! This crate provides the backend API for recording runs, deriving
//! speed and distance from their telemetry, granting challenges and
//! picking up collectible items along the way.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Store;
use services::{
    ChallengeEvaluator, ChallengeRules, CoachingService, CollectibleService, CoordinateValidator,
    RunService, TelemetryProcessor, UserService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Arc<dyn Store>,
    pub users: UserService,
    pub runs: RunService,
    pub collectibles: CollectibleService,
    pub challenges: ChallengeEvaluator,
    pub coaching: CoachingService,
}

impl AppState {
    /// Wire up the services over a storage backend.
    pub fn new(config: Config, db: Arc<dyn Store>) -> Self {
        let collectibles = CollectibleService::new(db.clone(), config.telemetry);
        let challenges =
            ChallengeEvaluator::new(db.clone(), ChallengeRules::new(config.challenges));
        let telemetry = TelemetryProcessor::new(db.clone(), collectibles.clone());
        let runs = RunService::new(
            db.clone(),
            CoordinateValidator::from_config(&config.telemetry),
            telemetry,
            challenges.clone(),
        );

        Self {
            users: UserService::new(db.clone()),
            coaching: CoachingService::new(db.clone()),
            runs,
            collectibles,
            challenges,
            config,
            db,
        }
    }
}
