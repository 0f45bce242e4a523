// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geo-located collectible items that athletes pick up while running.

use crate::models::Coordinate;
use serde::{Deserialize, Serialize};

/// A collectible point of interest with a reward value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectibleItem {
    /// External unique ID (also used as document ID)
    pub uid: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Image URL
    pub picture: String,
    /// Reward points
    pub value: i64,
    /// User IDs of athletes who picked this item up (set semantics)
    #[serde(default)]
    pub collected_by: Vec<String>,
}

impl CollectibleItem {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Add an athlete to the collected-by set.
    ///
    /// Returns `false` if the athlete had already collected this item.
    pub fn add_collector(&mut self, athlete_id: &str) -> bool {
        if self.collected_by.iter().any(|id| id == athlete_id) {
            return false;
        }
        self.collected_by.push(athlete_id.to_string());
        true
    }
}

/// Latitude/longitude search box.
///
/// The longitude range may extend past ±180°; [`BoundingBox::contains`]
/// wraps points across the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

/// Floor for the longitude scale factor near the poles.
const MIN_COS_LATITUDE: f64 = 1e-6;

impl BoundingBox {
    /// Box covering at least `degrees` of latitude-equivalent distance in
    /// every direction around `center`.
    ///
    /// Longitude degrees shrink with the cosine of latitude, so the
    /// longitude half-width is scaled by the widest latitude in the box.
    pub fn around(center: Coordinate, degrees: f64) -> Self {
        let min_latitude = (center.latitude - degrees).max(-90.0);
        let max_latitude = (center.latitude + degrees).min(90.0);

        let widest = min_latitude.abs().max(max_latitude.abs());
        let scale = widest.to_radians().cos().max(MIN_COS_LATITUDE);
        let half_width = (degrees / scale).min(180.0);

        Self {
            min_latitude,
            max_latitude,
            min_longitude: center.longitude - half_width,
            max_longitude: center.longitude + half_width,
        }
    }

    /// Whether the box spans every longitude.
    pub fn covers_all_longitudes(&self) -> bool {
        self.max_longitude - self.min_longitude >= 360.0
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        if !(self.min_latitude..=self.max_latitude).contains(&point.latitude) {
            return false;
        }
        if self.covers_all_longitudes() {
            return true;
        }
        let range = self.min_longitude..=self.max_longitude;
        [
            point.longitude,
            point.longitude - 360.0,
            point.longitude + 360.0,
        ]
        .iter()
        .any(|lon| range.contains(lon))
    }
}
