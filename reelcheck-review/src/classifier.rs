//! Classification client
//!
//! Sends a title and script text to the external Bechdel classifier and turns
//! the answer into a [`Classification`].
//!
//! # Wire format
//! - Request: `POST <endpoint>` with JSON `{"movieTitle", "scriptText", "movieYear"?}`
//!   and an optional `Authorization: Bearer <api_key>` header
//! - Response: JSON `{"result": "Pass" | "Fail", "explanation": "..."}`
//!
//! Transport timeouts, other transport or status failures, and unreadable
//! responses map to distinct [`ClassificationErrorKind`]s.
//!
//! [`ClassificationErrorKind`]: crate::error::ClassificationErrorKind

use async_trait::async_trait;
use reelcheck_common::config::ClassifierConfig;
use reelcheck_common::Verdict;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::ClassificationError;

/// Longest response body excerpt copied into error messages
const ERROR_BODY_EXCERPT: usize = 200;

/// Input sent to the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub title: String,
    pub source_text: String,
    pub year: Option<u32>,
}

/// Classifier verdict with its reasoning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    pub explanation: String,
}

/// A service able to classify submitted text against the rubric
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifier name for logging
    fn name(&self) -> &'static str;

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest<'a> {
    movie_title: &'a str,
    script_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    movie_year: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    result: Option<String>,
    explanation: Option<String>,
}

/// HTTP client for the hosted classifier function
pub struct HttpClassifier {
    http_client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpClassifier {
    /// Create a client with a per-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassificationError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ClassificationError::service_failure(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: None,
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassificationError> {
        Ok(Self::new(&config.endpoint, Duration::from_millis(config.timeout_ms))?
            .with_api_key(config.api_key.clone()))
    }

    /// Bearer token sent with each request; blank keys are ignored
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError> {
        debug!(
            endpoint = %self.endpoint,
            title = %request.title,
            text_length = request.source_text.len(),
            "Sending classification request"
        );

        let body = WireRequest {
            movie_title: &request.title,
            script_text: &request.source_text,
            movie_year: request.year,
        };

        let mut builder = self.http_client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ClassificationError::service_failure(format!(
                "Classifier returned status {}: {}",
                status,
                excerpt(&text)
            )));
        }

        let classification = parse_classification(&text)?;

        debug!(verdict = %classification.verdict, "Classification received");

        Ok(classification)
    }
}

fn transport_error(e: reqwest::Error) -> ClassificationError {
    if e.is_timeout() {
        ClassificationError::timeout(format!("Classifier request timed out: {}", e))
    } else {
        ClassificationError::service_failure(format!("Classifier request failed: {}", e))
    }
}

/// Parse a classifier response body
///
/// Empty bodies, invalid JSON, non-object JSON, blank fields and unknown
/// verdicts are all malformed responses.
pub fn parse_classification(body: &str) -> Result<Classification, ClassificationError> {
    if body.trim().is_empty() {
        return Err(ClassificationError::malformed("Classifier returned an empty response"));
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        ClassificationError::malformed(format!("Failed to parse classifier response: {}", e))
    })?;

    // Derived struct impls also accept a JSON array; only an object is valid
    if !value.is_object() {
        return Err(ClassificationError::malformed(
            "Classifier response is not a JSON object",
        ));
    }

    let wire: WireResponse = serde_json::from_value(value).map_err(|e| {
        ClassificationError::malformed(format!("Failed to read classifier response: {}", e))
    })?;

    let result = wire
        .result
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ClassificationError::malformed("Classifier response has no result"))?;

    let verdict = result.parse::<Verdict>().map_err(|_| {
        ClassificationError::malformed(format!("Classifier returned unknown result {:?}", result))
    })?;

    let explanation = wire
        .explanation
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ClassificationError::malformed("Classifier response has no explanation"))?;

    Ok(Classification {
        verdict,
        explanation,
    })
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(ERROR_BODY_EXCERPT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassificationErrorKind;

    #[test]
    fn test_parse_pass() {
        let parsed =
            parse_classification(r#"{"result": "Pass", "explanation": "Two named women talk."}"#)
                .unwrap();
        assert_eq!(parsed.verdict, Verdict::Pass);
        assert_eq!(parsed.explanation, "Two named women talk.");
    }

    #[test]
    fn test_parse_is_case_insensitive_and_ignores_extra_fields() {
        let parsed = parse_classification(
            r#"{"result": "fail", "explanation": " Only one woman. ", "confidence": 0.9}"#,
        )
        .unwrap();
        assert_eq!(parsed.verdict, Verdict::Fail);
        assert_eq!(parsed.explanation, "Only one woman.");
    }

    #[test]
    fn test_malformed_responses() {
        for body in [
            "",
            "   ",
            "not json",
            "{}",
            r#"{"result": "", "explanation": "x"}"#,
            r#"{"result": "Maybe", "explanation": "x"}"#,
            r#"{"result": "Pass"}"#,
            r#"{"result": "Pass", "explanation": "  "}"#,
            r#"["Pass", "x"]"#,
            r#""Pass""#,
            "null",
        ] {
            let err = parse_classification(body).unwrap_err();
            assert_eq!(
                err.kind,
                ClassificationErrorKind::MalformedResponse,
                "body {:?} should be malformed",
                body
            );
        }
    }

    #[test]
    fn test_wire_request_shape() {
        let body = WireRequest {
            movie_title: "Alien",
            script_text: "INT. NOSTROMO",
            movie_year: Some(1979),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["movieTitle"], "Alien");
        assert_eq!(json["scriptText"], "INT. NOSTROMO");
        assert_eq!(json["movieYear"], 1979);

        let body = WireRequest {
            movie_title: "Alien",
            script_text: "INT. NOSTROMO",
            movie_year: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("movieYear").is_none());
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(500);
        assert_eq!(excerpt(&long).chars().count(), ERROR_BODY_EXCERPT);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_blank_api_key_ignored() {
        let client = HttpClassifier::new("http://localhost:1/classify", Duration::from_secs(1))
            .unwrap()
            .with_api_key(Some("  ".to_string()));
        assert!(client.api_key.is_none());
        assert_eq!(client.endpoint(), "http://localhost:1/classify");
    }
}
