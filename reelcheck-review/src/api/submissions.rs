//! Submission API handlers
//!
//! POST /api/submissions, GET /api/submissions, GET /api/submissions/:id

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use reelcheck_common::{Submission, SubmissionId, SubmissionSummary, Verdict};
use serde::Serialize;
use tracing::error;

use super::{json_body, path_id};
use crate::error::{ApiError, ApiResult, SubmissionError};
use crate::identity::CallerIdentity;
use crate::services::{outcome_message, ListingService, SubmissionOrchestrator, SubmitRequest};
use crate::AppState;

/// POST /api/submissions response
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: SubmissionId,
    pub verdict: Verdict,
    pub message: String,
}

/// POST /api/submissions
///
/// Classifies and stores the submission. The pipeline runs on its own task so a
/// client that disconnects mid-classification does not abort a half-finished
/// submission; the result is still stored and appears in the listing.
pub async fn create_submission(
    State(state): State<AppState>,
    caller: CallerIdentity,
    request: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let request = json_body(request)?;

    let mut orchestrator =
        SubmissionOrchestrator::new(state.db.clone(), caller.gate(), state.classifier.clone())
            .with_classify_timeout(state.classify_timeout);

    if let Some(user) = &caller.0 {
        orchestrator = orchestrator.with_in_flight(state.sessions.in_flight_for(user).await);
    }

    let outcome: Result<Submission, SubmissionError> =
        tokio::spawn(async move { orchestrator.submit_record(request).await })
            .await
            .map_err(|e| {
                error!(error = %e, "Submission task failed");
                ApiError::Internal("Submission task failed".to_string())
            })?;

    let submission = outcome?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id: submission.id,
            verdict: submission.verdict,
            message: outcome_message(&submission),
        }),
    ))
}

/// GET /api/submissions
pub async fn list_submissions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SubmissionSummary>>> {
    let summaries = ListingService::new(state.db.clone()).list().await?;
    Ok(Json(summaries))
}

/// GET /api/submissions/:id
pub async fn get_submission(
    State(state): State<AppState>,
    id: Result<Path<SubmissionId>, PathRejection>,
) -> ApiResult<Json<Submission>> {
    let id = path_id(id)?;
    let submission = ListingService::new(state.db.clone()).get(id).await?;
    Ok(Json(submission))
}

pub fn submission_routes() -> Router<AppState> {
    Router::new()
        .route("/api/submissions", get(list_submissions).post(create_submission))
        .route("/api/submissions/:id", get(get_submission))
}
