// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run creation, listing and lifecycle routes.

use crate::error::Result;
use crate::models::{Run, RunStatus};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiJson;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/runs", get(list_runs).post(create_run))
        .route("/api/runs/{id}", get(get_run))
        .route("/api/runs/{id}/start", post(start_run))
        .route("/api/runs/{id}/stop", post(stop_run))
}

/// Run as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
    pub id: String,
    pub athlete_id: String,
    pub created_at: String,
    pub comment: String,
    pub status: RunStatus,
    /// Kilometers
    pub distance: Option<f64>,
    /// Seconds
    pub duration: Option<i64>,
    /// Meters per second
    pub average_speed: Option<f64>,
}

impl From<Run> for RunResponse {
    fn from(run: Run) -> Self {
        Self {
            id: run.id,
            athlete_id: run.athlete_id,
            created_at: run.created_at,
            comment: run.comment,
            status: run.status,
            distance: run.distance,
            duration: run.duration,
            average_speed: run.average_speed,
        }
    }
}

#[derive(Deserialize)]
struct CreateRunRequest {
    athlete_id: String,
    #[serde(default)]
    comment: String,
}

async fn create_run(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateRunRequest>,
) -> Result<(StatusCode, Json<RunResponse>)> {
    let run = state
        .runs
        .create_run(&request.athlete_id, request.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(run.into())))
}

#[derive(Deserialize)]
struct RunsQuery {
    athlete_id: Option<String>,
    status: Option<RunStatus>,
}

async fn list_runs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<RunResponse>>> {
    let runs = state
        .runs
        .list_runs(query.athlete_id.as_deref(), query.status)
        .await?;
    Ok(Json(runs.into_iter().map(RunResponse::from).collect()))
}

async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RunResponse>> {
    Ok(Json(state.runs.get_run(&id).await?.into()))
}

async fn start_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RunResponse>> {
    Ok(Json(state.runs.start(&id).await?.into()))
}

/// Response for stopping a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct StopRunResponse {
    #[serde(flatten)]
    pub run: RunResponse,
    /// Display names of challenges granted by this stop
    pub granted_challenges: Vec<String>,
}

async fn stop_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StopRunResponse>> {
    let outcome = state.runs.stop(&id).await?;
    Ok(Json(StopRunResponse {
        run: outcome.run.into(),
        granted_challenges: outcome
            .granted
            .into_iter()
            .map(|kind| kind.display_name().to_string())
            .collect(),
    }))
}
