//! Database initialization
//!
//! Opens (or creates) the SQLite database and brings the schema up to date.
//! Every statement is idempotent, so this runs on each startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Busy timeout applied to every connection
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // Per-connection pragmas; a pool-level PRAGMA only reaches one connection
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query(&format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all ReelCheck tables and indexes
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_submissions_table(pool).await?;
    create_comments_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the submissions table
///
/// `seq` is the store-assigned insertion order used to break `created_at` ties.
/// There is no UPDATE or DELETE path for this table.
async fn create_submissions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS submissions (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            guid TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL CHECK (length(trim(title)) > 0),
            year INTEGER CHECK (year IS NULL OR year > 0),
            source_text TEXT NOT NULL CHECK (length(trim(source_text)) > 0),
            verdict TEXT NOT NULL CHECK (verdict IN ('Pass', 'Fail')),
            explanation TEXT NOT NULL,
            poster_ref TEXT,
            external_ref TEXT,
            owner_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_submissions_recency ON submissions (created_at DESC, seq DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the comments table
///
/// The foreign key rejects comments on submissions that do not exist.
async fn create_comments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            guid TEXT NOT NULL UNIQUE,
            submission_id TEXT NOT NULL REFERENCES submissions(guid),
            author_id TEXT NOT NULL,
            body TEXT NOT NULL CHECK (length(trim(body)) > 0),
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_comments_thread ON comments (submission_id, created_at DESC, seq DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
