// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coach subscriptions, ratings and athlete profile bookkeeping.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{AthleteInfo, Subscription, User};
use crate::services::geo::round_to;
use crate::time_utils::now_rfc3339;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Validate)]
struct Rating {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    value: i64,
}

/// Requested profile changes. Omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct AthleteInfoUpdate {
    pub goals: Option<String>,
    /// Number or numeric string
    #[serde(default)]
    pub weight: Option<Value>,
}

#[derive(Debug, Validate)]
struct ValidatedInfo {
    #[validate(length(max = 1000, message = "Goals must be at most 1000 characters"))]
    goals: String,
    #[validate(range(min = 1, max = 899, message = "Weight must be between 1 and 899"))]
    weight: Option<i64>,
}

#[derive(Clone)]
pub struct CoachingService {
    db: Arc<dyn Store>,
}

impl CoachingService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    async fn user(&self, user_id: &str) -> Result<User> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }

    async fn coach(&self, coach_id: &str) -> Result<User> {
        match self.db.get_user(coach_id).await? {
            Some(user) if user.is_coach() => Ok(user),
            _ => Err(AppError::NotFound(format!("Coach {coach_id} not found"))),
        }
    }

    /// Subscribe an athlete to a coach.
    pub async fn subscribe(&self, coach_id: &str, athlete_id: &str) -> Result<Subscription> {
        let coach = self.coach(coach_id).await?;
        let athlete = self.user(athlete_id).await?;
        if !athlete.is_athlete() {
            return Err(AppError::Validation(format!(
                "User {athlete_id} is not an athlete"
            )));
        }

        let subscription = Subscription {
            coach_id: coach.id,
            athlete_id: athlete.id,
            rating: None,
            created_at: now_rfc3339(),
        };

        if !self.db.insert_subscription(&subscription).await? {
            return Err(AppError::Conflict(format!(
                "Athlete {athlete_id} is already subscribed to coach {coach_id}"
            )));
        }

        tracing::info!(
            coach_id = %coach_id,
            athlete_id = %athlete_id,
            "Athlete subscribed to coach"
        );
        Ok(subscription)
    }

    /// Rate a coach the athlete is subscribed to. Replaces an earlier rating.
    pub async fn rate(
        &self,
        coach_id: &str,
        athlete_id: &str,
        rating: &Value,
    ) -> Result<Subscription> {
        let value = parse_integer(rating)
            .ok_or_else(|| AppError::Validation("Rating must be an integer".to_string()))?;
        Rating { value }.validate()?;

        self.coach(coach_id).await?;

        let mut subscription = self
            .db
            .get_subscription(coach_id, athlete_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Athlete {athlete_id} is not subscribed to coach {coach_id}"
                ))
            })?;

        // Range checked above
        subscription.rating = Some(value as u8);
        self.db.update_subscription(&subscription).await?;

        tracing::info!(
            coach_id = %coach_id,
            athlete_id = %athlete_id,
            rating = value,
            "Coach rated"
        );
        Ok(subscription)
    }

    /// Average of all ratings a coach has received, 2 decimals.
    pub async fn coach_rating(&self, coach_id: &str) -> Result<Option<f64>> {
        let ratings: Vec<f64> = self
            .db
            .subscriptions_for_coach(coach_id)
            .await?
            .into_iter()
            .filter_map(|s| s.rating.map(f64::from))
            .collect();

        if ratings.is_empty() {
            return Ok(None);
        }
        let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
        Ok(Some(round_to(mean, 2)))
    }

    /// Stored profile, or empty defaults for a user without one.
    pub async fn athlete_info(&self, user_id: &str) -> Result<AthleteInfo> {
        self.user(user_id).await?;
        Ok(self
            .db
            .get_athlete_info(user_id)
            .await?
            .unwrap_or_else(|| AthleteInfo {
                user_id: user_id.to_string(),
                ..Default::default()
            }))
    }

    pub async fn update_athlete_info(
        &self,
        user_id: &str,
        update: AthleteInfoUpdate,
    ) -> Result<AthleteInfo> {
        let mut info = self.athlete_info(user_id).await?;

        let weight = match update.weight {
            None => info.weight.map(i64::from),
            Some(ref raw) => Some(parse_integer(raw).ok_or_else(|| {
                AppError::Validation("Weight must be a whole number".to_string())
            })?),
        };

        let validated = ValidatedInfo {
            goals: update.goals.unwrap_or(info.goals),
            weight,
        };
        validated.validate()?;

        info.goals = validated.goals;
        info.weight = validated.weight.map(|w| w as u32);
        self.db.upsert_athlete_info(&info).await?;

        tracing::debug!(user_id = %user_id, "Athlete info updated");
        Ok(info)
    }
}

/// Accept integers given as JSON numbers or numeric strings.
fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
