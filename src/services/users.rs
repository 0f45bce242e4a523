// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User registration and lookup.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{RunStatus, User, UserRole};
use crate::time_utils::now_rfc3339;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

/// Registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    pub role: UserRole,
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<dyn Store>,
}

impl UserService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, request: NewUser) -> Result<User> {
        request.validate()?;

        let username = request.username.trim().to_string();
        let existing = self.db.list_users(None).await?;
        if existing.iter().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!(
                "Username {username} is already taken"
            )));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            first_name: request.first_name,
            last_name: request.last_name,
            role: request.role,
            date_joined: now_rfc3339(),
        };
        self.db.insert_user(&user).await?;

        tracing::info!(user_id = %user.id, role = ?user.role, "User registered");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }

    pub async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>> {
        self.db.list_users(role).await
    }

    /// Number of finished runs for a user.
    pub async fn runs_finished(&self, user_id: &str) -> Result<usize> {
        let runs = self.db.list_runs(Some(user_id)).await?;
        Ok(runs
            .iter()
            .filter(|r| r.status == RunStatus::Finished)
            .count())
    }
}
