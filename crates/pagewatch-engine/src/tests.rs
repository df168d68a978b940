//! Engine tests over an in-memory SQLite backend.

use chrono::Duration;
use pagewatch_core::{
  change::ChangeType, content, snapshot::NewSnapshot, store::MonitorStore,
};
use pagewatch_store_sqlite::SqliteStore;

use crate::{ChangeSubmission, Engine, Error, SnapshotSubmission};

async fn engine() -> Engine<SqliteStore> {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  Engine::new(store)
}

fn snapshot(site_id: i64, content: &str) -> SnapshotSubmission {
  SnapshotSubmission {
    site_id,
    content: content.to_string(),
    content_hash: None,
    full_html: None,
    final_url: format!("https://example.com/site/{site_id}"),
  }
}

fn change(site_id: i64, old: Option<i64>, new: i64, old_text: &str, new_text: &str) -> ChangeSubmission {
  ChangeSubmission {
    site_id,
    old_snapshot_id: old,
    new_snapshot_id: new,
    change_type: None,
    old_content: old_text.to_string(),
    new_content: new_text.to_string(),
  }
}

// ─── Snapshot intake ─────────────────────────────────────────────────────────

#[tokio::test]
async fn first_snapshot_is_new_without_prior_content() {
  let engine = engine().await;

  let outcome = engine.submit_snapshot(snapshot(1, "Open")).await.unwrap();
  assert!(outcome.is_new);
  assert!(!outcome.has_prior_content);
}

#[tokio::test]
async fn resubmitted_content_resolves_to_stored_snapshot() {
  let engine = engine().await;

  let first = engine.submit_snapshot(snapshot(1, "Open")).await.unwrap();
  let second = engine.submit_snapshot(snapshot(1, "Open")).await.unwrap();

  assert!(!second.is_new);
  assert_eq!(second.snapshot_id, first.snapshot_id);
}

#[tokio::test]
async fn byte_trivial_variations_deduplicate() {
  let engine = engine().await;

  let first = engine.submit_snapshot(snapshot(1, "Open\nat ten")).await.unwrap();
  let second = engine
    .submit_snapshot(snapshot(1, "Open \r\nat ten\r\n\r\n"))
    .await
    .unwrap();

  assert!(!second.is_new);
  assert_eq!(second.snapshot_id, first.snapshot_id);
}

#[tokio::test]
async fn crawler_supplied_hash_is_stored() {
  let engine = engine().await;

  let mut submission = snapshot(1, "Open");
  let hash = content::hash_text("Open");
  submission.content_hash = Some(hash.clone());
  let outcome = engine.submit_snapshot(submission).await.unwrap();

  let stored = engine
    .store()
    .get_snapshot(outcome.snapshot_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.content_hash, hash);
}

#[tokio::test]
async fn malformed_hash_rejected_as_validation_error() {
  let engine = engine().await;

  let mut submission = snapshot(1, "Open");
  submission.content_hash = Some("not-a-hash".to_string());
  let err = engine.submit_snapshot(submission).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn non_positive_site_rejected() {
  let engine = engine().await;

  let err = engine.submit_snapshot(snapshot(0, "Open")).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Change classification ───────────────────────────────────────────────────

#[tokio::test]
async fn first_change_classified_initial_with_no_old_snapshot() {
  let engine = engine().await;
  let snap = engine.submit_snapshot(snapshot(1, "Open")).await.unwrap();

  let outcome = engine
    .submit_change(change(1, None, snap.snapshot_id, "", "Open"))
    .await
    .unwrap();
  assert_eq!(outcome.change_type, ChangeType::Initial);
  assert!(!outcome.deduplicated);

  let stored = &engine.store().changes_for_site(1, false).await.unwrap()[0];
  assert_eq!(stored.old_snapshot_id, None);
  assert_eq!(stored.old_content, "");
}

#[tokio::test]
async fn hint_is_advisory_and_overridden_by_durable_state() {
  let engine = engine().await;
  let snap = engine.submit_snapshot(snapshot(1, "Open")).await.unwrap();

  // Crawler claims "modified" but the site has no recorded history.
  let mut submission = change(1, Some(snap.snapshot_id), snap.snapshot_id, "x", "Open");
  submission.change_type = Some(ChangeType::Modified);
  let outcome = engine.submit_change(submission).await.unwrap();

  assert_eq!(outcome.change_type, ChangeType::Initial);
  let stored = &engine.store().changes_for_site(1, false).await.unwrap()[0];
  assert_eq!(stored.old_snapshot_id, None);
}

#[tokio::test]
async fn snapshot_without_initial_change_still_classifies_initial() {
  let engine = engine().await;

  // A crash after snapshot insert but before the change insert leaves a
  // snapshot with no recorded history; the next submission must not treat
  // that orphan as prior content.
  let first = engine.submit_snapshot(snapshot(1, "Open")).await.unwrap();
  assert!(!first.has_prior_content);
  let second = engine.submit_snapshot(snapshot(1, "Closed")).await.unwrap();
  assert!(!second.has_prior_content);

  let outcome = engine
    .submit_change(change(1, None, second.snapshot_id, "", "Closed"))
    .await
    .unwrap();
  assert_eq!(outcome.change_type, ChangeType::Initial);
}

#[tokio::test]
async fn second_transition_classified_modified() {
  let engine = engine().await;
  let open = engine.submit_snapshot(snapshot(1, "Open")).await.unwrap();
  engine
    .submit_change(change(1, None, open.snapshot_id, "", "Open"))
    .await
    .unwrap();

  let closed = engine.submit_snapshot(snapshot(1, "Closed")).await.unwrap();
  assert!(closed.has_prior_content);
  let outcome = engine
    .submit_change(change(1, Some(open.snapshot_id), closed.snapshot_id, "Open", "Closed"))
    .await
    .unwrap();

  assert_eq!(outcome.change_type, ChangeType::Modified);
  assert!(!outcome.deduplicated);

  let changes = engine.store().changes_for_site(1, false).await.unwrap();
  assert_eq!(changes.len(), 2);
  let modified = &changes[1];
  assert_eq!(modified.old_snapshot_id, Some(open.snapshot_id));
  assert!(modified.diff_rendered.contains("<span class=\"diff-removed\">Open</span>"));
  assert!(modified.diff_rendered.contains("<span class=\"diff-added\">Closed</span>"));
}

#[tokio::test]
async fn dangling_snapshot_reference_is_validation_error() {
  let engine = engine().await;

  let err = engine
    .submit_change(change(1, None, 12345, "", "Open"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Duplicate suppression ───────────────────────────────────────────────────

#[tokio::test]
async fn replayed_change_suppressed_by_snapshot_claim() {
  let engine = engine().await;
  let open = engine.submit_snapshot(snapshot(1, "Open")).await.unwrap();
  engine
    .submit_change(change(1, None, open.snapshot_id, "", "Open"))
    .await
    .unwrap();
  let closed = engine.submit_snapshot(snapshot(1, "Closed")).await.unwrap();

  let first = engine
    .submit_change(change(1, Some(open.snapshot_id), closed.snapshot_id, "Open", "Closed"))
    .await
    .unwrap();
  // Crawler retry after a lost response.
  let second = engine
    .submit_change(change(1, Some(open.snapshot_id), closed.snapshot_id, "Open", "Closed"))
    .await
    .unwrap();

  assert!(!first.deduplicated);
  assert!(second.deduplicated);
  assert_eq!(second.change_id, first.change_id);
  assert_eq!(engine.store().changes_for_site(1, false).await.unwrap().len(), 2);
}

#[tokio::test]
async fn retried_initial_converges_on_one_row() {
  let engine = engine().await;
  let open = engine.submit_snapshot(snapshot(1, "Open")).await.unwrap();

  let first = engine
    .submit_change(change(1, None, open.snapshot_id, "", "Open"))
    .await
    .unwrap();
  let second = engine
    .submit_change(change(1, None, open.snapshot_id, "", "Open"))
    .await
    .unwrap();

  assert_eq!(second.change_id, first.change_id);
  assert!(second.deduplicated);
  assert_eq!(engine.store().changes_for_site(1, false).await.unwrap().len(), 1);
}

// ─── Render budget ───────────────────────────────────────────────────────────

#[tokio::test]
async fn oversized_diff_truncated_and_flagged() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let engine = Engine::new(store).with_render_budget(64);

  let snap = engine
    .submit_snapshot(snapshot(1, "a very long piece of page content"))
    .await
    .unwrap();
  let outcome = engine
    .submit_change(change(1, None, snap.snapshot_id, "", "a very long piece of page content"))
    .await
    .unwrap();

  assert!(outcome.truncated);
  let stored = &engine.store().changes_for_site(1, false).await.unwrap()[0];
  assert!(stored.diff_rendered.contains("diff-truncated"));
  assert!(stored.diff_rendered.len() > 64); // notice appended after the cut
}

// ─── Compaction ──────────────────────────────────────────────────────────────

fn raw(site_id: i64, text: &str) -> NewSnapshot {
  let normalized = content::normalize(text);
  NewSnapshot {
    site_id,
    content_hash: normalized.content_hash,
    content_text: normalized.content_text,
    full_html:    None,
    final_url:    format!("https://example.com/site/{site_id}"),
  }
}

#[tokio::test]
async fn compaction_keeps_oldest_of_each_duplicate_group() {
  let engine = engine().await;
  let store = engine.store();

  let oldest = store.insert_snapshot_unchecked(raw(1, "Open")).await.unwrap();
  let mid = store.insert_snapshot_unchecked(raw(1, "Open")).await.unwrap();
  let newest = store.insert_snapshot_unchecked(raw(1, "Open")).await.unwrap();
  let other = store.insert_snapshot_unchecked(raw(1, "Closed")).await.unwrap();

  let report = engine.compact(Duration::minutes(10)).await.unwrap();
  assert_eq!(report.scanned, 4);
  assert_eq!(report.deleted, 2);

  assert!(store.get_snapshot(oldest).await.unwrap().is_some());
  assert!(store.get_snapshot(mid).await.unwrap().is_none());
  assert!(store.get_snapshot(newest).await.unwrap().is_none());
  assert!(store.get_snapshot(other).await.unwrap().is_some());
}

#[tokio::test]
async fn compaction_never_deletes_referenced_snapshots() {
  let engine = engine().await;
  let store = engine.store();

  let oldest = store.insert_snapshot_unchecked(raw(1, "Open")).await.unwrap();
  let referenced = store.insert_snapshot_unchecked(raw(1, "Open")).await.unwrap();
  let loose = store.insert_snapshot_unchecked(raw(1, "Open")).await.unwrap();
  engine
    .submit_change(change(1, None, referenced, "", "Open"))
    .await
    .unwrap();

  let report = engine.compact(Duration::minutes(10)).await.unwrap();
  assert_eq!(report.scanned, 3);
  assert_eq!(report.deleted, 1);

  assert!(store.get_snapshot(oldest).await.unwrap().is_some());
  assert!(store.get_snapshot(referenced).await.unwrap().is_some());
  assert!(store.get_snapshot(loose).await.unwrap().is_none());
}

#[tokio::test]
async fn compaction_groups_are_scoped_per_site() {
  let engine = engine().await;
  let store = engine.store();

  store.insert_snapshot_unchecked(raw(1, "Open")).await.unwrap();
  store.insert_snapshot_unchecked(raw(2, "Open")).await.unwrap();

  let report = engine.compact(Duration::minutes(10)).await.unwrap();
  assert_eq!(report.scanned, 2);
  assert_eq!(report.deleted, 0);
}

#[tokio::test]
async fn compaction_ignores_snapshots_outside_window() {
  let engine = engine().await;
  let store = engine.store();
  store.insert_snapshot_unchecked(raw(1, "Open")).await.unwrap();
  store.insert_snapshot_unchecked(raw(1, "Open")).await.unwrap();

  // A zero-length window puts everything before the cutoff.
  let report = engine.compact(Duration::seconds(0)).await.unwrap();
  assert_eq!(report.scanned, 0);
  assert_eq!(report.deleted, 0);
}

// ─── End to end ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_site_lifecycle() {
  let engine = engine().await;

  // First observation.
  let open = engine
    .submit_snapshot(snapshot(7, "Registration: Open"))
    .await
    .unwrap();
  assert!(open.is_new && !open.has_prior_content);
  let initial = engine
    .submit_change(change(7, None, open.snapshot_id, "", "Registration: Open"))
    .await
    .unwrap();
  assert_eq!(initial.change_type, ChangeType::Initial);

  // Steady state: recaptures of unchanged content resolve to the same row.
  let steady = engine
    .submit_snapshot(snapshot(7, "Registration: Open"))
    .await
    .unwrap();
  assert!(!steady.is_new && steady.has_prior_content);
  assert_eq!(steady.snapshot_id, open.snapshot_id);

  // The page changes.
  let closed = engine
    .submit_snapshot(snapshot(7, "Registration: Closed"))
    .await
    .unwrap();
  assert!(closed.is_new);
  let modified = engine
    .submit_change(change(
      7,
      Some(open.snapshot_id),
      closed.snapshot_id,
      "Registration: Open",
      "Registration: Closed",
    ))
    .await
    .unwrap();
  assert_eq!(modified.change_type, ChangeType::Modified);

  let changes = engine.store().changes_for_site(7, false).await.unwrap();
  assert_eq!(changes.len(), 2);
  assert_eq!(changes[0].change_type, ChangeType::Initial);
  assert_eq!(changes[1].change_type, ChangeType::Modified);
  assert!(changes[0].detected_at <= changes[1].detected_at);
}
