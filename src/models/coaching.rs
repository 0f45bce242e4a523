// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coach subscriptions, ratings and athlete profile info.

use serde::{Deserialize, Serialize};

/// An athlete's subscription to a coach, optionally carrying a rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub coach_id: String,
    pub athlete_id: String,
    /// Rating 1..=5 given by the athlete
    pub rating: Option<u8>,
    pub created_at: String,
}

impl Subscription {
    /// Storage key; one document per (coach, athlete) pair.
    pub fn document_id(&self) -> String {
        format!(
            "{}_{}",
            urlencoding::encode(&self.coach_id),
            urlencoding::encode(&self.athlete_id)
        )
    }
}

/// Athlete's self-reported profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AthleteInfo {
    pub user_id: String,
    #[serde(default)]
    pub goals: String,
    /// Weight in kilograms
    pub weight: Option<u32>,
}
