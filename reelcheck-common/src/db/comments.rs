//! Comment persistence
//!
//! Comments are inserted, listed per submission and deleted. The delete query is
//! scoped to the author as well as the id; callers still perform their own
//! ownership check before calling it.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use super::submissions::parse_guid;
use crate::models::{Comment, CommentId, NewComment, SubmissionId, UserId};
use crate::time::{now, parse_db_timestamp, to_db_timestamp};
use crate::{Error, Result};

/// Insert a comment and return the stored record
///
/// Fails with a foreign key violation when the submission does not exist.
pub async fn insert_comment(pool: &SqlitePool, new: &NewComment) -> Result<Comment> {
    let id = Uuid::new_v4();
    let proposed_at = to_db_timestamp(now());

    let created_at: String = sqlx::query_scalar(
        r#"
        INSERT INTO comments (guid, submission_id, author_id, body, created_at)
        VALUES (
            ?, ?, ?, ?,
            MAX(?, COALESCE((SELECT MAX(created_at) FROM comments), ''))
        )
        RETURNING created_at
        "#,
    )
    .bind(id.to_string())
    .bind(new.submission_id.to_string())
    .bind(new.author_id.as_str())
    .bind(&new.body)
    .bind(&proposed_at)
    .fetch_one(pool)
    .await?;

    tracing::debug!(
        comment_id = %id,
        submission_id = %new.submission_id,
        "Comment stored"
    );

    Ok(Comment {
        id,
        submission_id: new.submission_id,
        author_id: new.author_id.clone(),
        body: new.body.clone(),
        created_at: parse_db_timestamp(&created_at)?,
    })
}

/// Load a single comment
pub async fn get_comment(pool: &SqlitePool, id: CommentId) -> Result<Option<Comment>> {
    let row = sqlx::query(
        r#"
        SELECT guid, submission_id, author_id, body, created_at
        FROM comments
        WHERE guid = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(comment_from_row).transpose()
}

/// List the comments of one submission, newest first
pub async fn list_comments(pool: &SqlitePool, submission_id: SubmissionId) -> Result<Vec<Comment>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, submission_id, author_id, body, created_at
        FROM comments
        WHERE submission_id = ?
        ORDER BY created_at DESC, seq DESC
        "#,
    )
    .bind(submission_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(comment_from_row).collect()
}

/// Delete a comment written by `author`
///
/// Returns `false` when no matching row existed.
pub async fn delete_comment(pool: &SqlitePool, id: CommentId, author: &UserId) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE guid = ? AND author_id = ?")
        .bind(id.to_string())
        .bind(author.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
    let author: String = row.get("author_id");

    Ok(Comment {
        id: parse_guid(row.get("guid"))?,
        submission_id: parse_guid(row.get("submission_id"))?,
        author_id: UserId::new(author)
            .ok_or_else(|| Error::Internal("Comment row has blank author_id".to_string()))?,
        body: row.get("body"),
        created_at: parse_db_timestamp(&row.get::<String, _>("created_at"))?,
    })
}
