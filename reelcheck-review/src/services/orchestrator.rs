//! Submission orchestrator
//!
//! Runs one submission through validation → identity → in-flight guard →
//! classification → persistence. Steps are strictly sequential. Nothing is
//! written unless classification succeeds, and the submission insert is the
//! last step, so a failure at any point leaves no partial record.

use reelcheck_common::db::submissions;
use reelcheck_common::models::NewSubmission;
use reelcheck_common::{Submission, SubmissionId};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::classifier::{ClassificationRequest, Classifier};
use crate::error::{ClassificationError, SubmissionError};
use crate::identity::IdentityGate;
use crate::session::InFlightFlag;

/// Default bound on one classification call
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(60);

/// Caller-supplied submission fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source_text: String,
    /// Signed so that negative years reach validation
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub poster_ref: Option<String>,
    #[serde(default)]
    pub external_ref: Option<String>,
}

impl SubmitRequest {
    pub fn new(title: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_text: source_text.into(),
            ..Self::default()
        }
    }

    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    /// Check the fields and return the validated year
    fn validate(&self) -> Result<Option<u32>, SubmissionError> {
        if self.title.trim().is_empty() {
            return Err(SubmissionError::Validation("a title is required".to_string()));
        }
        if self.source_text.trim().is_empty() {
            return Err(SubmissionError::Validation("script text is required".to_string()));
        }
        self.year
            .map(|year| {
                u32::try_from(year)
                    .ok()
                    .filter(|y| *y > 0)
                    .ok_or_else(|| {
                        SubmissionError::Validation("year must be a positive number".to_string())
                    })
            })
            .transpose()
    }
}

/// Request-scoped submission pipeline for one caller
pub struct SubmissionOrchestrator {
    db: SqlitePool,
    identity: Arc<dyn IdentityGate>,
    classifier: Arc<dyn Classifier>,
    in_flight: InFlightFlag,
    classify_timeout: Duration,
}

impl SubmissionOrchestrator {
    pub fn new(
        db: SqlitePool,
        identity: Arc<dyn IdentityGate>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            db,
            identity,
            classifier,
            in_flight: InFlightFlag::new(),
            classify_timeout: DEFAULT_CLASSIFY_TIMEOUT,
        }
    }

    /// Share the caller's in-flight flag with this instance
    pub fn with_in_flight(mut self, in_flight: InFlightFlag) -> Self {
        self.in_flight = in_flight;
        self
    }

    pub fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }

    /// Whether a submission is currently running for this caller
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_set()
    }

    /// Classify and store a submission, returning its id
    pub async fn submit(&self, request: SubmitRequest) -> Result<SubmissionId, SubmissionError> {
        self.submit_record(request).await.map(|submission| submission.id)
    }

    /// Classify and store a submission, returning the stored record
    pub async fn submit_record(&self, request: SubmitRequest) -> Result<Submission, SubmissionError> {
        let year = request.validate()?;

        let owner = self
            .identity
            .current_user()
            .await
            .ok_or(SubmissionError::Authentication)?;

        let Some(_guard) = self.in_flight.try_acquire() else {
            warn!(user = %owner, "Rejected submission: another one is in flight");
            return Err(SubmissionError::Busy);
        };

        info!(
            user = %owner,
            title = %request.title,
            classifier = self.classifier.name(),
            "Classifying submission"
        );

        let classification_request = ClassificationRequest {
            title: request.title.clone(),
            source_text: request.source_text.clone(),
            year,
        };

        let classification = match tokio::time::timeout(
            self.classify_timeout,
            self.classifier.classify(&classification_request),
        )
        .await
        {
            Ok(Ok(classification)) => classification,
            Ok(Err(e)) => {
                warn!(user = %owner, error = %e, "Classification failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    user = %owner,
                    timeout_ms = self.classify_timeout.as_millis() as u64,
                    "Classification timed out"
                );
                return Err(ClassificationError::timeout(format!(
                    "No classifier response within {} ms",
                    self.classify_timeout.as_millis()
                ))
                .into());
            }
        };

        let new_submission = NewSubmission {
            title: request.title,
            year,
            source_text: request.source_text,
            verdict: classification.verdict,
            explanation: classification.explanation,
            poster_ref: request.poster_ref,
            external_ref: request.external_ref,
            owner_id: owner.clone(),
        };

        let submission = submissions::insert_submission(&self.db, &new_submission)
            .await
            .map_err(|e| {
                warn!(user = %owner, error = %e, "Classification result discarded: save failed");
                SubmissionError::Persistence(e)
            })?;

        info!(
            submission_id = %submission.id,
            user = %owner,
            verdict = %submission.verdict,
            "Submission stored"
        );

        Ok(submission)
    }
}

/// One-line outcome shown to the submitter
pub fn outcome_message(submission: &Submission) -> String {
    let outcome = match submission.verdict {
        reelcheck_common::Verdict::Pass => "passes",
        reelcheck_common::Verdict::Fail => "fails",
    };
    format!("{} {} the Bechdel test.", submission.title, outcome)
}
