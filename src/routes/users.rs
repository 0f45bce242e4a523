// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User, coaching and athlete profile routes.

use crate::error::Result;
use crate::models::{AthleteInfo, Subscription, User, UserRole};
use crate::services::{AthleteInfoUpdate, NewUser};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::ApiJson;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", get(get_user))
        .route("/api/subscribe_to_coach/{coach_id}", post(subscribe_to_coach))
        .route("/api/rate_coach/{coach_id}", post(rate_coach))
        .route(
            "/api/athlete_info/{user_id}",
            get(get_athlete_info).put(update_athlete_info),
        )
}

// ─── Users ───────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: UserRole,
    pub date_joined: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            date_joined: user.date_joined,
        }
    }
}

/// Single user with role-specific details.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDetailResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    /// Athletes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runs_finished: Option<usize>,
    /// Coaches only; average of received ratings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[derive(Deserialize)]
struct UsersQuery {
    role: Option<UserRole>,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    let users = state.users.list_users(query.role).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserDetailResponse>> {
    let user = state.users.get_user(&id).await?;

    let (runs_finished, rating) = match user.role {
        UserRole::Athlete => (Some(state.users.runs_finished(&id).await?), None),
        UserRole::Coach => (None, state.coaching.coach_rating(&id).await?),
    };

    Ok(Json(UserDetailResponse {
        user: user.into(),
        runs_finished,
        rating,
    }))
}

// ─── Coaching ────────────────────────────────────────────────

#[derive(Deserialize)]
struct SubscribeRequest {
    athlete: String,
}

async fn subscribe_to_coach(
    State(state): State<Arc<AppState>>,
    Path(coach_id): Path<String>,
    ApiJson(request): ApiJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<Subscription>)> {
    let subscription = state
        .coaching
        .subscribe(&coach_id, &request.athlete)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

#[derive(Deserialize)]
struct RateRequest {
    athlete: String,
    /// Integer 1..=5; numeric strings are accepted
    #[serde(default)]
    rating: Value,
}

async fn rate_coach(
    State(state): State<Arc<AppState>>,
    Path(coach_id): Path<String>,
    ApiJson(request): ApiJson<RateRequest>,
) -> Result<Json<Subscription>> {
    let subscription = state
        .coaching
        .rate(&coach_id, &request.athlete, &request.rating)
        .await?;
    Ok(Json(subscription))
}

// ─── Athlete Info ────────────────────────────────────────────

async fn get_athlete_info(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<AthleteInfo>> {
    Ok(Json(state.coaching.athlete_info(&user_id).await?))
}

async fn update_athlete_info(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    ApiJson(update): ApiJson<AthleteInfoUpdate>,
) -> Result<Json<AthleteInfo>> {
    Ok(Json(
        state
            .coaching
            .update_athlete_info(&user_id, update)
            .await?,
    ))
}
