// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Whether a user trains (athlete) or trains others (coach).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Athlete,
    Coach,
}

/// User profile stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    /// When the user registered (ISO 8601)
    pub date_joined: String,
}

impl User {
    /// Display name, falling back to the username when no real name is set.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    pub fn is_athlete(&self) -> bool {
        self.role == UserRole::Athlete
    }

    pub fn is_coach(&self) -> bool {
        self.role == UserRole::Coach
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: "u1".to_string(),
            username: "runner42".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            role: UserRole::Athlete,
            date_joined: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_full_name_joins_names() {
        assert_eq!(user("Ada", "Lovelace").full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        assert_eq!(user("", "").full_name(), "runner42");
        assert_eq!(user("Ada", "").full_name(), "Ada");
    }
}
