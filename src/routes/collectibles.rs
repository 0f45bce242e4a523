// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collectible item listing and bulk import.

use crate::error::Result;
use crate::models::CollectibleItem;
use crate::services::ImportReport;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::ApiJson;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/collectible_item", get(list_items))
        .route("/api/upload_file", post(upload_file))
        .route("/api/athlete/{id}/items", get(athlete_items))
}

async fn list_items(State(state): State<Arc<AppState>>) -> Result<Json<Vec<CollectibleItem>>> {
    Ok(Json(state.collectibles.list().await?))
}

/// Spreadsheet rows, already parsed by the client.
#[derive(Deserialize)]
struct UploadRequest {
    rows: Vec<Map<String, Value>>,
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<UploadRequest>,
) -> Result<Json<ImportReport>> {
    Ok(Json(state.collectibles.import(request.rows).await?))
}

async fn athlete_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CollectibleItem>>> {
    state.users.get_user(&id).await?;
    Ok(Json(state.collectibles.collected_by(&id).await?))
}
