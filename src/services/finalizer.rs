// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run finalization: aggregate statistics recomputed from raw telemetry.

use crate::models::{Position, RunSummary};
use crate::services::geo::{distance_km, round_to};

/// Incremental and recomputed distances further apart than this are logged.
pub const DIVERGENCE_TOLERANCE_KM: f64 = 0.05;

/// Compute a run's aggregates from its positions.
///
/// Distance is summed over consecutive pairs from the raw coordinates, not
/// taken from the per-point cumulative field. Pure: the same positions
/// always give the same summary.
pub fn summarize(positions: &[Position]) -> RunSummary {
    let mut ordered: Vec<&Position> = positions.iter().collect();
    ordered.sort_by_key(|p| p.captured_at);

    let (Some(first), Some(last)) = (ordered.first(), ordered.last()) else {
        return RunSummary::default();
    };
    if ordered.len() < 2 {
        return RunSummary::default();
    }

    let total_km: f64 = ordered
        .windows(2)
        .map(|pair| distance_km(pair[0].coordinate(), pair[1].coordinate()))
        .sum();

    let duration = (last.captured_at - first.captured_at).num_seconds();

    let speeds: Vec<f64> = ordered.iter().filter_map(|p| p.speed).collect();
    let average_speed = if speeds.is_empty() {
        0.0
    } else {
        round_to(speeds.iter().sum::<f64>() / speeds.len() as f64, 2)
    };

    RunSummary {
        distance: round_to(total_km, 3),
        duration,
        average_speed,
    }
}

/// The last point's incremental distance and its difference from the
/// recomputed total, if that difference exceeds [`DIVERGENCE_TOLERANCE_KM`].
pub fn incremental_divergence(
    positions: &[Position],
    summary: &RunSummary,
) -> Option<(f64, f64)> {
    let last = positions.iter().max_by_key(|p| p.captured_at)?;
    let incremental = last.distance?;
    let delta = (incremental - summary.distance).abs();
    (delta > DIVERGENCE_TOLERANCE_KM).then_some((incremental, delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use crate::services::telemetry::derive_fields;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn point(id: &str, lat: f64, secs: i64, speed: Option<f64>) -> Position {
        Position {
            id: id.to_string(),
            run_id: "r1".to_string(),
            latitude: lat,
            longitude: 0.0,
            captured_at: at(secs),
            speed,
            distance: None,
        }
    }

    #[test]
    fn test_empty_and_single_point_runs_are_zero() {
        assert_eq!(summarize(&[]), RunSummary::default());
        assert_eq!(
            summarize(&[point("a", 1.0, 0, Some(3.0))]),
            RunSummary::default()
        );
    }

    #[test]
    fn test_summary_from_unordered_points() {
        let positions = vec![
            point("c", 0.02, 240, Some(4.0)),
            point("a", 0.0, 0, Some(0.0)),
            point("b", 0.01, 120, Some(5.0)),
        ];

        let summary = summarize(&positions);

        // 0.02 degree of latitude at the equator is ~2.211 km
        assert_eq!(summary.distance, 2.211);
        assert_eq!(summary.duration, 240);
        assert_eq!(summary.average_speed, 3.0);
    }

    #[test]
    fn test_average_ignores_missing_speeds() {
        let positions = vec![
            point("a", 0.0, 0, None),
            point("b", 0.001, 30, Some(3.4)),
            point("c", 0.002, 61, Some(3.0)),
        ];
        let summary = summarize(&positions);
        assert_eq!(summary.average_speed, 3.2);
        assert_eq!(summary.duration, 61);
    }

    #[test]
    fn test_no_speeds_gives_zero_average() {
        let positions = vec![point("a", 0.0, 0, None), point("b", 0.001, 10, None)];
        assert_eq!(summarize(&positions).average_speed, 0.0);
    }

    #[test]
    fn test_summarize_is_repeatable() {
        let positions = vec![
            point("a", 0.0, 0, Some(0.0)),
            point("b", 0.0013, 40, Some(3.59)),
        ];
        assert_eq!(summarize(&positions), summarize(&positions));
    }

    #[test]
    fn test_incremental_distance_tracks_recomputed_total() {
        // Many short segments: per-segment rounding drifts away from the total
        let mut positions = Vec::new();
        let mut previous: Option<Position> = None;
        for i in 0..100 {
            let lat = i as f64 * 0.00004;
            let derived = derive_fields(previous.as_ref(), Coordinate::new(lat, 0.0), at(i * 5));
            let p = Position {
                speed: Some(derived.speed),
                distance: Some(derived.distance),
                ..point(&i.to_string(), lat, i * 5, None)
            };
            previous = Some(p.clone());
            positions.push(p);
        }

        let summary = summarize(&positions);
        // 99 segments of ~4.4 m, each rounded down to 0.00 km
        assert!(summary.distance > 0.4);
        assert_eq!(positions.last().unwrap().distance, Some(0.0));
        let (incremental, delta) = incremental_divergence(&positions, &summary).unwrap();
        assert_eq!(incremental, 0.0);
        assert!(delta > DIVERGENCE_TOLERANCE_KM);
    }

    #[test]
    fn test_consistent_distance_has_no_divergence() {
        let mut a = point("a", 0.0, 0, Some(0.0));
        a.distance = Some(0.0);
        let mut b = point("b", 0.01, 300, Some(3.69));
        b.distance = Some(1.11);
        let positions = vec![a, b];
        let summary = summarize(&positions);
        assert!(incremental_divergence(&positions, &summary).is_none());
    }
}
