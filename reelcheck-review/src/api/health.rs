//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use reelcheck_common::db::submissions;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok" or "degraded")
    pub status: String,
    /// Module name ("reelcheck-review")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Users with a classification currently running
    pub active_submissions: usize,
    /// Stored submissions; absent when the database cannot be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_submissions: Option<i64>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let (status, stored_submissions) = match submissions::count_submissions(&state.db).await {
        Ok(count) => ("ok", Some(count)),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read the database");
            ("degraded", None)
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: "reelcheck-review".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        active_submissions: state.sessions.active_submissions().await,
        stored_submissions,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
