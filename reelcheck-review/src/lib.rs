//! reelcheck-review library interface
//!
//! Accepts film scripts, classifies them against the Bechdel rubric through an
//! external service, stores the verdicts and hosts comment threads on them.

pub mod api;
pub mod classifier;
pub mod error;
pub mod identity;
pub mod services;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::classifier::Classifier;
use crate::services::orchestrator::DEFAULT_CLASSIFY_TIMEOUT;
use crate::session::SessionRegistry;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub classifier: Arc<dyn Classifier>,
    /// Per-user in-flight submission flags
    pub sessions: SessionRegistry,
    /// Upper bound on one classification call
    pub classify_timeout: Duration,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            db,
            classifier,
            sessions: SessionRegistry::new(),
            classify_timeout: DEFAULT_CLASSIFY_TIMEOUT,
            startup_time: Utc::now(),
        }
    }

    pub fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::submission_routes())
        .merge(api::comment_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
