//! Submission persistence
//!
//! Append-only: rows are inserted once and read many times. No update or
//! delete query exists for this table.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::models::{NewSubmission, Submission, SubmissionId, SubmissionSummary, UserId, Verdict};
use crate::time::{now, parse_db_timestamp, to_db_timestamp};
use crate::{Error, Result};

/// Insert a submission and return the stored record
///
/// The store assigns `guid` and `created_at`. `created_at` never goes backwards:
/// it is clamped to the newest existing value inside the same statement.
pub async fn insert_submission(pool: &SqlitePool, new: &NewSubmission) -> Result<Submission> {
    let id = Uuid::new_v4();
    let proposed_at = to_db_timestamp(now());

    let created_at: String = sqlx::query_scalar(
        r#"
        INSERT INTO submissions (
            guid, title, year, source_text, verdict, explanation,
            poster_ref, external_ref, owner_id, created_at
        ) VALUES (
            ?, ?, ?, ?, ?, ?, ?, ?, ?,
            MAX(?, COALESCE((SELECT MAX(created_at) FROM submissions), ''))
        )
        RETURNING created_at
        "#,
    )
    .bind(id.to_string())
    .bind(&new.title)
    .bind(new.year.map(i64::from))
    .bind(&new.source_text)
    .bind(new.verdict.as_str())
    .bind(&new.explanation)
    .bind(&new.poster_ref)
    .bind(&new.external_ref)
    .bind(new.owner_id.as_str())
    .bind(&proposed_at)
    .fetch_one(pool)
    .await?;

    tracing::debug!(submission_id = %id, created_at = %created_at, "Submission stored");

    Ok(Submission {
        id,
        title: new.title.clone(),
        year: new.year,
        source_text: new.source_text.clone(),
        verdict: new.verdict,
        explanation: new.explanation.clone(),
        poster_ref: new.poster_ref.clone(),
        external_ref: new.external_ref.clone(),
        owner_id: new.owner_id.clone(),
        created_at: parse_db_timestamp(&created_at)?,
    })
}

/// Load a single submission with all fields
pub async fn get_submission(pool: &SqlitePool, id: SubmissionId) -> Result<Option<Submission>> {
    let row = sqlx::query(
        r#"
        SELECT guid, title, year, source_text, verdict, explanation,
               poster_ref, external_ref, owner_id, created_at
        FROM submissions
        WHERE guid = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(submission_from_row).transpose()
}

/// Check whether a submission exists
pub async fn submission_exists(pool: &SqlitePool, id: SubmissionId) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions WHERE guid = ?")
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// List all submissions, newest first
///
/// Ties on `created_at` resolve to the later insertion first.
pub async fn list_submissions(pool: &SqlitePool) -> Result<Vec<SubmissionSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, title, year, verdict, created_at, poster_ref
        FROM submissions
        ORDER BY created_at DESC, seq DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(SubmissionSummary {
                id: parse_guid(row.get("guid"))?,
                title: row.get("title"),
                year: parse_year(row.get("year"))?,
                verdict: row.get::<String, _>("verdict").parse::<Verdict>()?,
                created_at: parse_db_timestamp(&row.get::<String, _>("created_at"))?,
                poster_ref: row.get("poster_ref"),
            })
        })
        .collect()
}

/// Total number of stored submissions
pub async fn count_submissions(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

fn submission_from_row(row: &SqliteRow) -> Result<Submission> {
    let owner: String = row.get("owner_id");

    Ok(Submission {
        id: parse_guid(row.get("guid"))?,
        title: row.get("title"),
        year: parse_year(row.get("year"))?,
        source_text: row.get("source_text"),
        verdict: row.get::<String, _>("verdict").parse::<Verdict>()?,
        explanation: row.get("explanation"),
        poster_ref: row.get("poster_ref"),
        external_ref: row.get("external_ref"),
        owner_id: UserId::new(owner)
            .ok_or_else(|| Error::Internal("Submission row has blank owner_id".to_string()))?,
        created_at: parse_db_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

pub(crate) fn parse_guid(value: String) -> Result<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|e| Error::Internal(format!("Failed to parse guid '{}': {}", value, e)))
}

fn parse_year(value: Option<i64>) -> Result<Option<u32>> {
    value
        .map(|y| {
            u32::try_from(y).map_err(|_| Error::Internal(format!("Stored year out of range: {}", y)))
        })
        .transpose()
}
