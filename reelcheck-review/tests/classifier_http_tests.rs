//! HTTP classifier client tests against a local stub service

use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use reelcheck_common::Verdict;
use reelcheck_review::classifier::{ClassificationRequest, Classifier, HttpClassifier};
use reelcheck_review::error::ClassificationErrorKind;
use serde_json::{json, Value};
use std::time::Duration;

/// Serve `app` on an ephemeral port and return its base URL
async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn request() -> ClassificationRequest {
    ClassificationRequest {
        title: "Alien".to_string(),
        source_text: "INT. NOSTROMO".to_string(),
        year: Some(1979),
    }
}

fn client(base: &str) -> HttpClassifier {
    HttpClassifier::new(format!("{}/classify", base), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_successful_classification() {
    let app = Router::new().route(
        "/classify",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["movieTitle"], "Alien");
            assert_eq!(body["scriptText"], "INT. NOSTROMO");
            assert_eq!(body["movieYear"], 1979);
            Json(json!({"result": "Pass", "explanation": "Ripley and Lambert talk."}))
        }),
    );
    let base = spawn_stub(app).await;

    let classification = client(&base).classify(&request()).await.unwrap();

    assert_eq!(classification.verdict, Verdict::Pass);
    assert_eq!(classification.explanation, "Ripley and Lambert talk.");
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let app = Router::new().route(
        "/classify",
        post(|headers: HeaderMap| async move {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if auth == "Bearer secret-key" {
                (StatusCode::OK, Json(json!({"result": "Fail", "explanation": "No."})))
            } else {
                (StatusCode::UNAUTHORIZED, Json(json!({"error": "missing key"})))
            }
        }),
    );
    let base = spawn_stub(app).await;

    let err = client(&base).classify(&request()).await.unwrap_err();
    assert_eq!(err.kind, ClassificationErrorKind::ServiceFailure);

    let classification = client(&base)
        .with_api_key(Some("secret-key".to_string()))
        .classify(&request())
        .await
        .unwrap();
    assert_eq!(classification.verdict, Verdict::Fail);
}

#[tokio::test]
async fn test_server_error_is_service_failure() {
    let app = Router::new().route(
        "/classify",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model overloaded") }),
    );
    let base = spawn_stub(app).await;

    let err = client(&base).classify(&request()).await.unwrap_err();

    assert_eq!(err.kind, ClassificationErrorKind::ServiceFailure);
    assert!(err.message.contains("500"));
    assert!(err.message.contains("model overloaded"));
}

#[tokio::test]
async fn test_unreadable_body_is_malformed() {
    let app = Router::new().route("/classify", post(|| async { "the film passes, probably" }));
    let base = spawn_stub(app).await;

    let err = client(&base).classify(&request()).await.unwrap_err();

    assert_eq!(err.kind, ClassificationErrorKind::MalformedResponse);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let app = Router::new().route(
        "/classify",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"result": "Pass", "explanation": "Late."}))
        }),
    );
    let base = spawn_stub(app).await;

    let classifier =
        HttpClassifier::new(format!("{}/classify", base), Duration::from_millis(100)).unwrap();
    let err = classifier.classify(&request()).await.unwrap_err();

    assert_eq!(err.kind, ClassificationErrorKind::Timeout);
}

#[tokio::test]
async fn test_unreachable_service_is_service_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr))
        .classify(&request())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ClassificationErrorKind::ServiceFailure);
}
