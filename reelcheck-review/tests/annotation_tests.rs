//! Integration tests for comment threads

mod helpers;

use helpers::{create_test_db, orchestrator, user, FixedClassifier};
use reelcheck_common::SubmissionId;
use reelcheck_review::error::AnnotationError;
use reelcheck_review::identity::StaticIdentity;
use reelcheck_review::services::{AnnotationService, SubmitRequest};
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

async fn seed_submission(pool: &SqlitePool) -> SubmissionId {
    orchestrator(pool, Some("owner"), FixedClassifier::passing())
        .submit(SubmitRequest::new("Alien", "INT. NOSTROMO"))
        .await
        .unwrap()
}

fn service_for(pool: &SqlitePool, caller: Option<&str>) -> AnnotationService {
    AnnotationService::new(pool.clone(), Arc::new(StaticIdentity::from(caller.map(user))))
}

#[tokio::test]
async fn test_create_and_list_newest_first() {
    let (_dir, pool) = create_test_db().await;
    let submission_id = seed_submission(&pool).await;
    let alice = service_for(&pool, Some("alice"));

    let first = alice.create(submission_id, "Ripley and Lambert talk.").await.unwrap();
    let second = service_for(&pool, Some("bob"))
        .create(submission_id, "  Agreed.  ")
        .await
        .unwrap();

    let thread = service_for(&pool, None).list(submission_id).await.unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[0].id, second);
    assert_eq!(thread[0].body, "Agreed.");
    assert_eq!(thread[0].author_id.as_str(), "bob");
    assert_eq!(thread[1].id, first);
}

#[tokio::test]
async fn test_unknown_submission_has_empty_thread() {
    let (_dir, pool) = create_test_db().await;

    let thread = service_for(&pool, None).list(Uuid::new_v4()).await.unwrap();

    assert!(thread.is_empty());
}

#[tokio::test]
async fn test_create_requires_identity_and_text() {
    let (_dir, pool) = create_test_db().await;
    let submission_id = seed_submission(&pool).await;

    let err = service_for(&pool, None)
        .create(submission_id, "Hello")
        .await
        .unwrap_err();
    assert!(matches!(err, AnnotationError::Authentication));

    let err = service_for(&pool, Some("alice"))
        .create(submission_id, " \n ")
        .await
        .unwrap_err();
    assert!(matches!(err, AnnotationError::Validation(_)));

    assert!(service_for(&pool, None).list(submission_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_comment_on_missing_submission_is_not_found() {
    let (_dir, pool) = create_test_db().await;

    let err = service_for(&pool, Some("alice"))
        .create(Uuid::new_v4(), "Hello")
        .await
        .unwrap_err();

    assert!(matches!(err, AnnotationError::NotFound(_)));
}

#[tokio::test]
async fn test_only_author_may_delete() {
    let (_dir, pool) = create_test_db().await;
    let submission_id = seed_submission(&pool).await;
    let comment_id = service_for(&pool, Some("alice"))
        .create(submission_id, "Mine")
        .await
        .unwrap();

    let err = service_for(&pool, Some("bob")).delete(comment_id).await.unwrap_err();
    assert!(matches!(err, AnnotationError::Authorization));

    let err = service_for(&pool, None).delete(comment_id).await.unwrap_err();
    assert!(matches!(err, AnnotationError::Authentication));

    assert_eq!(service_for(&pool, None).list(submission_id).await.unwrap().len(), 1);

    service_for(&pool, Some("alice")).delete(comment_id).await.unwrap();
    assert!(service_for(&pool, None).list(submission_id).await.unwrap().is_empty());

    let err = service_for(&pool, Some("alice")).delete(comment_id).await.unwrap_err();
    assert!(matches!(err, AnnotationError::NotFound(_)));
}
