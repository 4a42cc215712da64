//! Error types for reelcheck-review
//!
//! Service operations return typed errors (`SubmissionError`,
//! `AnnotationError`, `ListingError`). HTTP handlers convert them into
//! `ApiError`, which renders a JSON body with a distinct code per kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Why a classification call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassificationErrorKind {
    /// No answer within the configured bound
    Timeout,
    /// Transport failure or non-success status from the service
    ServiceFailure,
    /// Response arrived but could not be understood
    MalformedResponse,
}

impl fmt::Display for ClassificationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClassificationErrorKind::Timeout => "timeout",
            ClassificationErrorKind::ServiceFailure => "service failure",
            ClassificationErrorKind::MalformedResponse => "malformed response",
        };
        f.write_str(s)
    }
}

/// Classification client error
#[derive(Debug, Clone, Error)]
#[error("Classifier {kind}: {message}")]
pub struct ClassificationError {
    pub kind: ClassificationErrorKind,
    pub message: String,
}

impl ClassificationError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ClassificationErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn service_failure(message: impl Into<String>) -> Self {
        Self {
            kind: ClassificationErrorKind::ServiceFailure,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ClassificationErrorKind::MalformedResponse,
            message: message.into(),
        }
    }

    pub fn user_message(&self) -> String {
        match self.kind {
            ClassificationErrorKind::Timeout => {
                "The classifier took too long to respond. Please try again.".to_string()
            }
            ClassificationErrorKind::ServiceFailure => {
                "The classifier is unavailable right now. Please try again later.".to_string()
            }
            ClassificationErrorKind::MalformedResponse => {
                "The classifier returned a result that could not be read.".to_string()
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, ClassificationErrorKind::MalformedResponse)
    }
}

/// Submission pipeline error
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Not authenticated")]
    Authentication,

    #[error("Invalid submission: {0}")]
    Validation(String),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("Failed to save submission: {0}")]
    Persistence(#[source] reelcheck_common::Error),

    #[error("A submission is already in progress for this user")]
    Busy,
}

impl SubmissionError {
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Authentication => "You must be signed in to submit a script.".to_string(),
            SubmissionError::Validation(detail) => format!("Missing information: {}", detail),
            SubmissionError::Classification(e) => e.user_message(),
            SubmissionError::Persistence(_) => {
                "The analysis finished but could not be saved. Please submit again.".to_string()
            }
            SubmissionError::Busy => {
                "An analysis is already running. Wait for it to finish before submitting again."
                    .to_string()
            }
        }
    }

    /// Whether resubmitting the same input may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            SubmissionError::Classification(e) => e.is_retryable(),
            SubmissionError::Persistence(_) | SubmissionError::Busy => true,
            SubmissionError::Authentication | SubmissionError::Validation(_) => false,
        }
    }
}

/// Comment thread error
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("Not authenticated")]
    Authentication,

    #[error("Invalid comment: {0}")]
    Validation(String),

    #[error("Comment belongs to another user")]
    Authorization,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Comment storage failed: {0}")]
    Persistence(#[source] reelcheck_common::Error),
}

impl AnnotationError {
    pub fn user_message(&self) -> String {
        match self {
            AnnotationError::Authentication => "You must be signed in to comment.".to_string(),
            AnnotationError::Validation(detail) => format!("Comment rejected: {}", detail),
            AnnotationError::Authorization => "You can only delete your own comments.".to_string(),
            AnnotationError::NotFound(what) => format!("{} was not found.", what),
            AnnotationError::Persistence(_) => {
                "Comments could not be updated right now. Please try again.".to_string()
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AnnotationError::Persistence(_))
    }
}

/// Submission read error
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Submission query failed: {0}")]
    Persistence(#[source] reelcheck_common::Error),
}

impl ListingError {
    pub fn user_message(&self) -> String {
        match self {
            ListingError::NotFound(what) => format!("{} was not found.", what),
            ListingError::Persistence(_) => {
                "Analyses could not be loaded right now. Please try again.".to_string()
            }
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error(transparent)]
    Listing(#[from] ListingError),

    /// Request body or path could not be read (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status, error code, user-facing message and retry hint
    fn parts(&self) -> (StatusCode, &'static str, String, bool) {
        match self {
            ApiError::Submission(e) => {
                let (status, code) = match e {
                    SubmissionError::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
                    SubmissionError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
                    SubmissionError::Classification(c) => classification_status(c),
                    SubmissionError::Persistence(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_FAILED")
                    }
                    SubmissionError::Busy => (StatusCode::CONFLICT, "SUBMISSION_IN_PROGRESS"),
                };
                (status, code, e.user_message(), e.is_retryable())
            }
            ApiError::Annotation(e) => {
                let (status, code) = match e {
                    AnnotationError::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
                    AnnotationError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
                    AnnotationError::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                    AnnotationError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    AnnotationError::Persistence(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_FAILED")
                    }
                };
                (status, code, e.user_message(), e.is_retryable())
            }
            ApiError::Listing(e) => {
                let (status, code, retryable) = match e {
                    ListingError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", false),
                    ListingError::Persistence(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_FAILED", true)
                    }
                };
                (status, code, e.user_message(), retryable)
            }
            ApiError::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                format!("Invalid request: {}", detail),
                false,
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
                false,
            ),
        }
    }
}

fn classification_status(e: &ClassificationError) -> (StatusCode, &'static str) {
    match e.kind {
        ClassificationErrorKind::Timeout => (StatusCode::GATEWAY_TIMEOUT, "CLASSIFIER_TIMEOUT"),
        ClassificationErrorKind::ServiceFailure => (StatusCode::BAD_GATEWAY, "CLASSIFIER_FAILURE"),
        ClassificationErrorKind::MalformedResponse => {
            (StatusCode::BAD_GATEWAY, "CLASSIFIER_MALFORMED_RESPONSE")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, retryable) = self.parts();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "Request failed");
        } else {
            tracing::debug!(code = error_code, error = %self, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "retryable": retryable,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
