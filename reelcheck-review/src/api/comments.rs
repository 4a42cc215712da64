//! Comment API handlers

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use reelcheck_common::{Comment, CommentId, SubmissionId};
use serde::{Deserialize, Serialize};

use super::{json_body, path_id};
use crate::error::ApiResult;
use crate::identity::CallerIdentity;
use crate::services::AnnotationService;
use crate::AppState;

/// POST /api/submissions/:id/comments request
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub body: String,
}

/// POST /api/submissions/:id/comments response
#[derive(Debug, Serialize)]
pub struct CreateCommentResponse {
    pub id: CommentId,
}

/// GET /api/submissions/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    caller: CallerIdentity,
    submission_id: Result<Path<SubmissionId>, PathRejection>,
) -> ApiResult<Json<Vec<Comment>>> {
    let submission_id = path_id(submission_id)?;
    let comments = AnnotationService::new(state.db.clone(), caller.gate())
        .list(submission_id)
        .await?;
    Ok(Json(comments))
}

/// POST /api/submissions/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    caller: CallerIdentity,
    submission_id: Result<Path<SubmissionId>, PathRejection>,
    request: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateCommentResponse>)> {
    let submission_id = path_id(submission_id)?;
    let request = json_body(request)?;
    let id = AnnotationService::new(state.db.clone(), caller.gate())
        .create(submission_id, &request.body)
        .await?;
    Ok((StatusCode::CREATED, Json(CreateCommentResponse { id })))
}

/// DELETE /api/comments/:id
pub async fn delete_comment(
    State(state): State<AppState>,
    caller: CallerIdentity,
    comment_id: Result<Path<CommentId>, PathRejection>,
) -> ApiResult<StatusCode> {
    let comment_id = path_id(comment_id)?;
    AnnotationService::new(state.db.clone(), caller.gate())
        .delete(comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/submissions/:id/comments",
            get(list_comments).post(create_comment),
        )
        .route("/api/comments/:id", delete(delete_comment))
}
