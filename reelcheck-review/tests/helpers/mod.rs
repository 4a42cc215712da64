//! Test helper utilities
//!
//! Shared fixtures for reelcheck-review integration tests: on-disk test
//! databases and scripted classifiers.

#![allow(dead_code)]

use async_trait::async_trait;
use reelcheck_common::db::init_database;
use reelcheck_common::{UserId, Verdict};
use reelcheck_review::classifier::{Classification, ClassificationRequest, Classifier};
use reelcheck_review::error::ClassificationError;
use reelcheck_review::identity::StaticIdentity;
use reelcheck_review::services::SubmissionOrchestrator;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

/// Create a temporary database with the schema applied
///
/// The TempDir must be kept alive for the duration of the test.
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let pool = init_database(&temp_dir.path().join("reelcheck.db"))
        .await
        .expect("Failed to initialize test database");
    (temp_dir, pool)
}

pub fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}

/// Orchestrator acting as `caller` (None = anonymous)
pub fn orchestrator(
    pool: &SqlitePool,
    caller: Option<&str>,
    classifier: Arc<dyn Classifier>,
) -> SubmissionOrchestrator {
    let identity = StaticIdentity::from(caller.map(user));
    SubmissionOrchestrator::new(pool.clone(), Arc::new(identity), classifier)
}

/// Returns the same verdict for every request and counts calls
pub struct FixedClassifier {
    verdict: Verdict,
    explanation: String,
    calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn new(verdict: Verdict, explanation: &str) -> Arc<Self> {
        Arc::new(Self {
            verdict,
            explanation: explanation.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn passing() -> Arc<Self> {
        Self::new(Verdict::Pass, "Two named women discuss their research.")
    }

    pub fn failing_verdict() -> Arc<Self> {
        Self::new(Verdict::Fail, "The women only talk about the captain.")
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Classification {
            verdict: self.verdict,
            explanation: self.explanation.clone(),
        })
    }
}

/// Always fails with the given error
pub struct ErrorClassifier {
    error: ClassificationError,
}

impl ErrorClassifier {
    pub fn new(error: ClassificationError) -> Arc<Self> {
        Arc::new(Self { error })
    }
}

#[async_trait]
impl Classifier for ErrorClassifier {
    fn name(&self) -> &'static str {
        "error"
    }

    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError> {
        Err(self.error.clone())
    }
}

/// Holds every request until released
pub struct GatedClassifier {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
}

impl GatedClassifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }

    /// Wait until a request is being held
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let the held request finish with a Pass verdict
    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for GatedClassifier {
    fn name(&self) -> &'static str {
        "gated"
    }

    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(Classification {
            verdict: Verdict::Pass,
            explanation: "Released".to_string(),
        })
    }
}

/// Sleeps before answering
pub struct SlowClassifier {
    delay: Duration,
}

impl SlowClassifier {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay })
    }
}

#[async_trait]
impl Classifier for SlowClassifier {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError> {
        tokio::time::sleep(self.delay).await;
        Ok(Classification {
            verdict: Verdict::Pass,
            explanation: "Eventually".to_string(),
        })
    }
}
