// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Incremental telemetry processing.
//!
//! Each admitted position gets its speed and cumulative distance derived
//! from the run's preceding position (by capture time, not by insertion
//! order), and is matched against nearby collectible items.

use crate::db::Store;
use crate::error::Result;
use crate::models::{Coordinate, Position, Run};
use crate::services::collectibles::CollectibleService;
use crate::services::geo::{distance_meters, round_to};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Per-point values derived from the preceding point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFields {
    /// Meters per second, 2 decimals
    pub speed: f64,
    /// Cumulative km, 2 decimals
    pub distance: f64,
}

/// Derive speed and cumulative distance for a new point.
///
/// The first point of a run has zero speed and distance. A non-positive
/// time delta (duplicate or out-of-order timestamp) yields zero speed.
pub fn derive_fields(
    previous: Option<&Position>,
    point: Coordinate,
    captured_at: DateTime<Utc>,
) -> DerivedFields {
    let Some(previous) = previous else {
        return DerivedFields {
            speed: 0.0,
            distance: 0.0,
        };
    };

    let meters = distance_meters(previous.coordinate(), point);
    let elapsed_ms = (captured_at - previous.captured_at).num_milliseconds();

    let speed = if elapsed_ms > 0 {
        round_to(meters / (elapsed_ms as f64 / 1000.0), 2)
    } else {
        0.0
    };

    let segment_km = round_to(meters / 1000.0, 2);
    let distance = round_to(previous.distance.unwrap_or(0.0) + segment_km, 2);

    DerivedFields { speed, distance }
}

/// Stores positions with their derived fields.
#[derive(Clone)]
pub struct TelemetryProcessor {
    db: Arc<dyn Store>,
    collectibles: CollectibleService,
}

impl TelemetryProcessor {
    pub fn new(db: Arc<dyn Store>, collectibles: CollectibleService) -> Self {
        Self { db, collectibles }
    }

    /// Record a validated point for an in-progress run.
    ///
    /// The caller holds the run's lock, so the preceding point read here
    /// cannot change before the new point is written.
    pub async fn record(
        &self,
        run: &Run,
        point: Coordinate,
        captured_at: DateTime<Utc>,
    ) -> Result<Position> {
        let previous = self.db.preceding_position(&run.id, captured_at).await?;

        let collected = self
            .collectibles
            .collect_nearby(&run.athlete_id, point)
            .await?;
        for item in &collected {
            tracing::info!(
                run_id = %run.id,
                athlete_id = %run.athlete_id,
                item_uid = %item.uid,
                value = item.value,
                "Collectible item picked up"
            );
        }

        let derived = derive_fields(previous.as_ref(), point, captured_at);

        let position = Position {
            id: uuid::Uuid::new_v4().to_string(),
            run_id: run.id.clone(),
            latitude: point.latitude,
            longitude: point.longitude,
            captured_at,
            speed: Some(derived.speed),
            distance: Some(derived.distance),
        };

        self.db.insert_position(&position).await?;

        tracing::debug!(
            run_id = %run.id,
            position_id = %position.id,
            speed = derived.speed,
            distance = derived.distance,
            first_point = previous.is_none(),
            "Position recorded"
        );

        Ok(position)
    }
}
