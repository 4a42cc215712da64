//! Comment threads on submissions
//!
//! Anyone may read a thread. Writing requires a signed-in caller, and only the
//! author of a comment may delete it.

use reelcheck_common::db::{comments, submissions};
use reelcheck_common::models::NewComment;
use reelcheck_common::{Comment, CommentId, SubmissionId};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::AnnotationError;
use crate::identity::IdentityGate;

pub struct AnnotationService {
    db: SqlitePool,
    identity: Arc<dyn IdentityGate>,
}

impl AnnotationService {
    pub fn new(db: SqlitePool, identity: Arc<dyn IdentityGate>) -> Self {
        Self { db, identity }
    }

    /// Comments on a submission, newest first
    ///
    /// An unknown submission has an empty thread.
    pub async fn list(&self, submission_id: SubmissionId) -> Result<Vec<Comment>, AnnotationError> {
        comments::list_comments(&self.db, submission_id)
            .await
            .map_err(AnnotationError::Persistence)
    }

    /// Add a comment as the current user
    pub async fn create(
        &self,
        submission_id: SubmissionId,
        body: &str,
    ) -> Result<CommentId, AnnotationError> {
        let author = self
            .identity
            .current_user()
            .await
            .ok_or(AnnotationError::Authentication)?;

        let body = body.trim();
        if body.is_empty() {
            return Err(AnnotationError::Validation("comment text is required".to_string()));
        }

        let exists = submissions::submission_exists(&self.db, submission_id)
            .await
            .map_err(AnnotationError::Persistence)?;
        if !exists {
            return Err(AnnotationError::NotFound(format!("Submission {}", submission_id)));
        }

        let comment = comments::insert_comment(
            &self.db,
            &NewComment {
                submission_id,
                author_id: author.clone(),
                body: body.to_string(),
            },
        )
        .await
        .map_err(AnnotationError::Persistence)?;

        info!(
            comment_id = %comment.id,
            submission_id = %submission_id,
            user = %author,
            "Comment added"
        );

        Ok(comment.id)
    }

    /// Delete one of the current user's comments
    pub async fn delete(&self, comment_id: CommentId) -> Result<(), AnnotationError> {
        let caller = self
            .identity
            .current_user()
            .await
            .ok_or(AnnotationError::Authentication)?;

        let comment = comments::get_comment(&self.db, comment_id)
            .await
            .map_err(AnnotationError::Persistence)?
            .ok_or_else(|| AnnotationError::NotFound(format!("Comment {}", comment_id)))?;

        if comment.author_id != caller {
            warn!(
                comment_id = %comment_id,
                user = %caller,
                "Rejected delete of another user's comment"
            );
            return Err(AnnotationError::Authorization);
        }

        let deleted = comments::delete_comment(&self.db, comment_id, &caller)
            .await
            .map_err(AnnotationError::Persistence)?;
        if !deleted {
            // Removed between the lookup and the delete
            return Err(AnnotationError::NotFound(format!("Comment {}", comment_id)));
        }

        info!(comment_id = %comment_id, user = %caller, "Comment deleted");
        Ok(())
    }
}
