use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::common::{sample_audit, InMemoryAuditRemote};
use crate::audits::domain::ResponseUpdate;
use crate::audits::remote::RemoteAuditStore;
use crate::audits::session::{ResponseEditSession, SaveStatus};
use crate::config::AutosaveConfig;
use crate::error::RemoteError;

fn session() -> (
    ResponseEditSession<InMemoryAuditRemote>,
    Arc<InMemoryAuditRemote>,
) {
    let remote = Arc::new(InMemoryAuditRemote::with_audit(sample_audit()));
    let session = ResponseEditSession::new(
        "audit-1",
        Arc::clone(&remote),
        AutosaveConfig::default(),
    );
    (session, remote)
}

/// Let spawned timer/flush tasks run to completion under the paused clock.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn score_then_comment_in_one_window_saves_once_with_both_fields() {
    let (session, remote) = session();

    session.edit(ResponseUpdate::new("q-1").with_score(4));
    tokio::time::sleep(Duration::from_millis(300)).await;
    session.edit(ResponseUpdate::new("q-1").with_comment("pipeline is solid"));

    // Still inside the second window, nothing flushed yet.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(remote.save_calls.load(Ordering::Relaxed), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    settle().await;

    assert_eq!(remote.save_calls.load(Ordering::Relaxed), 1);
    let batches = remote.recorded_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].question_id, "q-1");
    assert_eq!(batches[0][0].score, Some(4));
    assert_eq!(batches[0][0].comment.as_deref(), Some("pipeline is solid"));
    assert_eq!(session.status(), SaveStatus::Saved);
    assert!(!session.has_pending());
}

#[tokio::test(start_paused = true)]
async fn edits_spaced_beyond_the_window_flush_as_separate_batches() {
    let (session, remote) = session();

    session.edit(ResponseUpdate::new("q-1").with_score(5));
    tokio::time::sleep(Duration::from_millis(900)).await;
    settle().await;

    session.edit(ResponseUpdate::new("q-2").with_score(2));
    tokio::time::sleep(Duration::from_millis(900)).await;
    settle().await;

    let batches = remote.recorded_batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0][0].question_id, "q-1");
    assert_eq!(batches[1][0].question_id, "q-2");
}

#[tokio::test(start_paused = true)]
async fn edits_to_different_questions_in_one_window_batch_together() {
    let (session, remote) = session();

    session.edit(ResponseUpdate::new("q-1").with_score(5));
    session.edit(ResponseUpdate::new("q-2").with_score(3));
    tokio::time::sleep(Duration::from_millis(900)).await;
    settle().await;

    let batches = remote.recorded_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
}

#[tokio::test(start_paused = true)]
async fn flush_saves_immediately_without_waiting_for_the_window() {
    let (session, remote) = session();

    session.edit(ResponseUpdate::new("q-1").with_score(4));
    session.flush().await;

    assert_eq!(remote.save_calls.load(Ordering::Relaxed), 1);
    assert!(!session.has_pending());

    // The invalidated timer must not fire a second save later.
    tokio::time::sleep(Duration::from_millis(1000)).await;
    settle().await;
    assert_eq!(remote.save_calls.load(Ordering::Relaxed), 1);
}

#[tokio::test(start_paused = true)]
async fn saved_indicator_reverts_to_idle_after_the_display_window() {
    let (session, _remote) = session();

    session.edit(ResponseUpdate::new("q-1").with_score(4));
    session.flush().await;
    assert_eq!(session.status(), SaveStatus::Saved);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    settle().await;
    assert_eq!(session.status(), SaveStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn failed_save_surfaces_error_and_retry_carries_backfilled_fields() {
    let (session, remote) = session();

    remote.fail_next(RemoteError::Unavailable("store offline".to_string()));
    session.edit(
        ResponseUpdate::new("q-1")
            .with_score(4)
            .with_comment("original comment"),
    );
    tokio::time::sleep(Duration::from_millis(900)).await;
    settle().await;

    assert_eq!(session.status(), SaveStatus::Error);
    assert_eq!(
        session.error().as_deref(),
        Some("remote store unavailable: store offline")
    );
    assert!(session.has_pending());
    assert!(remote.recorded_batches().is_empty());

    // A fresh edit to the same question merges over the restored batch.
    session.edit(ResponseUpdate::new("q-1").with_comment("revised comment"));
    session.flush().await;

    let batches = remote.recorded_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0][0].score, Some(4));
    assert_eq!(batches[0][0].comment.as_deref(), Some("revised comment"));
    assert_eq!(session.status(), SaveStatus::Saved);
    assert!(session.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn finalized_audit_rejects_further_saves() {
    let (session, remote) = session();
    remote.finalize("audit-1").await.expect("finalize succeeds");

    session.edit(ResponseUpdate::new("q-1").with_score(4));
    tokio::time::sleep(Duration::from_millis(900)).await;
    settle().await;

    assert_eq!(session.status(), SaveStatus::Error);
    assert_eq!(
        session.error().as_deref(),
        Some("request rejected: audit is finalized")
    );
}

#[tokio::test(start_paused = true)]
async fn progress_counts_pending_scores_before_they_are_saved() {
    let (session, remote) = session();
    let audit = remote
        .get_audit("audit-1")
        .await
        .expect("audit exists");

    let before = session.progress(&audit);
    assert_eq!(before.answered, 0);
    assert_eq!(before.total, 3);
    assert_eq!(before.unanswered_mandatory, 3);

    session.edit(ResponseUpdate::new("q-1").with_score(5));
    let during = session.progress(&audit);
    assert_eq!(during.answered, 1);
    assert_eq!(during.unanswered_mandatory, 2);
    assert_eq!(during.percentage(), 33);

    // Comment-only edits do not count a question as answered.
    session.edit(ResponseUpdate::new("q-2").with_comment("pending note"));
    assert_eq!(session.progress(&audit).answered, 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_last_handle_cancels_the_armed_timer() {
    let (session, remote) = session();

    session.edit(ResponseUpdate::new("q-1").with_score(3));
    drop(session);

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;

    assert_eq!(remote.save_calls.load(Ordering::Relaxed), 0);
    assert!(remote.recorded_batches().is_empty());
}
