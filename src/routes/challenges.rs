// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge listing routes.

use crate::error::Result;
use crate::models::ChallengeKind;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/challenges", get(list_challenges))
        .route("/api/challenges_summary", get(challenges_summary))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeResponse {
    pub athlete: String,
    pub key: ChallengeKind,
    pub name: String,
    pub granted_at: String,
}

#[derive(Deserialize)]
struct ChallengesQuery {
    athlete: Option<String>,
}

async fn list_challenges(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChallengesQuery>,
) -> Result<Json<Vec<ChallengeResponse>>> {
    let challenges = state.challenges.list(query.athlete.as_deref()).await?;
    Ok(Json(
        challenges
            .into_iter()
            .map(|c| ChallengeResponse {
                athlete: c.athlete_id,
                key: c.kind,
                name: c.kind.display_name().to_string(),
                granted_at: c.granted_at,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeHolder {
    pub id: String,
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChallengeGroup {
    pub key: ChallengeKind,
    pub name: String,
    pub athletes: Vec<ChallengeHolder>,
}

async fn challenges_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChallengeGroup>>> {
    let groups = state.challenges.summary().await?;
    Ok(Json(
        groups
            .into_iter()
            .map(|(kind, holders)| ChallengeGroup {
                key: kind,
                name: kind.display_name().to_string(),
                athletes: holders
                    .into_iter()
                    .map(|user| ChallengeHolder {
                        full_name: user.full_name(),
                        id: user.id,
                    })
                    .collect(),
            })
            .collect(),
    ))
}
