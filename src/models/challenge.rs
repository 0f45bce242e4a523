// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenges: named awards granted to an athlete at most once.

use serde::{Deserialize, Serialize};

/// The closed set of achievements the evaluator can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Ten finished runs
    TenRuns,
    /// Fifty kilometers across all runs
    FiftyKm,
    /// Two kilometers within ten minutes in one run
    #[serde(rename = "fast_2km")]
    Fast2Km,
}

impl ChallengeKind {
    /// All challenges, in evaluation order.
    pub const ALL: [ChallengeKind; 3] = [
        ChallengeKind::TenRuns,
        ChallengeKind::FiftyKm,
        ChallengeKind::Fast2Km,
    ];

    /// Stable key used in storage document IDs.
    pub fn key(self) -> &'static str {
        match self {
            ChallengeKind::TenRuns => "ten_runs",
            ChallengeKind::FiftyKm => "fifty_km",
            ChallengeKind::Fast2Km => "fast_2km",
        }
    }

    /// Human-readable name shown to users.
    pub fn display_name(self) -> &'static str {
        match self {
            ChallengeKind::TenRuns => "Complete 10 runs!",
            ChallengeKind::FiftyKm => "Run 50 km in total!",
            ChallengeKind::Fast2Km => "2 km in under 10 minutes!",
        }
    }
}

/// A challenge held by an athlete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub athlete_id: String,
    pub kind: ChallengeKind,
    /// When the challenge was granted (ISO 8601)
    pub granted_at: String,
}

impl Challenge {
    /// Storage key; one document per (athlete, challenge) pair.
    pub fn document_id(&self) -> String {
        format!(
            "{}_{}",
            urlencoding::encode(&self.athlete_id),
            self.kind.key()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serde_matches_key() {
        for kind in ChallengeKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.key()));
        }
    }

    #[test]
    fn test_document_id_is_per_athlete_and_kind() {
        let challenge = Challenge {
            athlete_id: "athlete/1".to_string(),
            kind: ChallengeKind::FiftyKm,
            granted_at: "2024-01-01T00:00:00Z".to_string(),
        };
        assert_eq!(challenge.document_id(), "athlete%2F1_fifty_km");
    }
}
