// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/company_details", get(company_details))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompanyDetails {
    pub company_name: String,
    pub slogan: String,
    pub contacts: String,
}

async fn company_details(State(state): State<Arc<AppState>>) -> Json<CompanyDetails> {
    let company = &state.config.company;
    Json(CompanyDetails {
        company_name: company.name.clone(),
        slogan: company.slogan.clone(),
        contacts: company.contacts.clone(),
    })
}
