//! Domain models shared by the ReelCheck services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Store-assigned identifier of a submission
pub type SubmissionId = Uuid;

/// Store-assigned identifier of a comment
pub type CommentId = Uuid;

/// Identity of an acting user, as issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Build a user id; blank values are not identities
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classifier outcome for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "Pass",
            Verdict::Fail => "Fail",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = Error;

    /// Case-insensitive; surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass" => Ok(Verdict::Pass),
            "fail" => Ok(Verdict::Fail),
            other => Err(Error::InvalidInput(format!("Unknown verdict: {:?}", other))),
        }
    }
}

/// A classified text record. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub title: String,
    pub year: Option<u32>,
    pub source_text: String,
    pub verdict: Verdict,
    pub explanation: String,
    pub poster_ref: Option<String>,
    pub external_ref: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Listing projection of a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub id: SubmissionId,
    pub title: String,
    pub year: Option<u32>,
    pub verdict: Verdict,
    pub created_at: DateTime<Utc>,
    pub poster_ref: Option<String>,
}

/// Fields of a submission before the store assigns id and timestamp
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub title: String,
    pub year: Option<u32>,
    pub source_text: String,
    pub verdict: Verdict,
    pub explanation: String,
    pub poster_ref: Option<String>,
    pub external_ref: Option<String>,
    pub owner_id: UserId,
}

/// A text annotation attached to a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub submission_id: SubmissionId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub submission_id: SubmissionId,
    pub author_id: UserId,
    pub body: String,
}
