// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Great-circle distance between coordinates.

use crate::models::Coordinate;
use geo::{Distance, Geodesic, Point};

/// Geodesic distance in meters on the WGS84 ellipsoid.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    Geodesic.distance(to_point(a), to_point(b))
}

/// Geodesic distance in kilometers.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    distance_meters(a, b) / 1000.0
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn to_point(c: Coordinate) -> Point<f64> {
    // geo points are (x = longitude, y = latitude)
    Point::new(c.longitude, c.latitude)
}
