// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Telemetry ingestion and listing.

use crate::error::{AppError, Result};
use crate::models::{Coordinate, Position};
use crate::time_utils::{format_utc_rfc3339, parse_utc_timestamp};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiJson;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/positions", get(list_positions).post(submit_position))
}

/// Telemetry point as returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct PositionResponse {
    pub id: String,
    pub run: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date_time: String,
    pub speed: Option<f64>,
    pub distance: Option<f64>,
}

impl From<Position> for PositionResponse {
    fn from(position: Position) -> Self {
        Self {
            date_time: format_utc_rfc3339(position.captured_at),
            id: position.id,
            run: position.run_id,
            latitude: position.latitude,
            longitude: position.longitude,
            speed: position.speed,
            distance: position.distance,
        }
    }
}

#[derive(Deserialize)]
struct SubmitPositionRequest {
    run: String,
    latitude: f64,
    longitude: f64,
    /// RFC3339, or naive ISO 8601 taken as UTC
    date_time: String,
}

async fn submit_position(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SubmitPositionRequest>,
) -> Result<(StatusCode, Json<PositionResponse>)> {
    let captured_at = parse_utc_timestamp(&request.date_time).ok_or_else(|| {
        AppError::Validation(format!("Invalid date_time: {}", request.date_time))
    })?;

    let position = state
        .runs
        .submit_position(
            &request.run,
            Coordinate::new(request.latitude, request.longitude),
            captured_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(position.into())))
}

#[derive(Deserialize)]
struct PositionsQuery {
    run: Option<String>,
}

async fn list_positions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PositionsQuery>,
) -> Result<Json<Vec<PositionResponse>>> {
    let positions = state.runs.list_positions(query.run.as_deref()).await?;
    Ok(Json(
        positions.into_iter().map(PositionResponse::from).collect(),
    ))
}
