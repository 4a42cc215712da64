//! HTTP API handlers for reelcheck-review

pub mod comments;
pub mod health;
pub mod submissions;

pub use comments::comment_routes;
pub use health::health_routes;
pub use submissions::submission_routes;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Unwrap a JSON body, turning extractor rejections into tagged API errors
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Unwrap a `:id` path segment
pub(crate) fn path_id(id: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    id.map(|Path(id)| id)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}
