//! # ReelCheck Common Library
//!
//! Shared code for the ReelCheck services including:
//! - Domain models (submissions, comments, verdicts)
//! - Database initialization and persistence queries
//! - Configuration loading
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{Comment, CommentId, Submission, SubmissionId, SubmissionSummary, UserId, Verdict};
