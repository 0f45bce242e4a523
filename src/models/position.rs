// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GPS telemetry point belonging to a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Stored telemetry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Position ID (also used as document ID)
    pub id: String,
    /// Owning run ID
    pub run_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Capture time, stored as epoch milliseconds so it orders numerically
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
    /// Instantaneous speed in m/s relative to the preceding point
    pub speed: Option<f64>,
    /// Cumulative km from the run's first point
    pub distance: Option<f64>,
}

impl Position {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
