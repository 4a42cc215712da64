//! Read-only access to stored submissions

use reelcheck_common::db::submissions;
use reelcheck_common::{Submission, SubmissionId, SubmissionSummary};
use sqlx::SqlitePool;

use crate::error::ListingError;

/// Lists and loads submissions for any caller, signed in or not
#[derive(Clone)]
pub struct ListingService {
    db: SqlitePool,
}

impl ListingService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// All submissions, newest first
    pub async fn list(&self) -> Result<Vec<SubmissionSummary>, ListingError> {
        submissions::list_submissions(&self.db)
            .await
            .map_err(ListingError::Persistence)
    }

    /// Full record of one submission
    pub async fn get(&self, id: SubmissionId) -> Result<Submission, ListingError> {
        submissions::get_submission(&self.db, id)
            .await
            .map_err(ListingError::Persistence)?
            .ok_or_else(|| ListingError::NotFound(format!("Submission {}", id)))
    }
}
