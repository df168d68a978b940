//! The `MonitorStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `pagewatch-store-sqlite`). Higher layers (`pagewatch-engine`,
//! `pagewatch-server`) depend on this abstraction, not on any concrete
//! backend.
//!
//! The backend is relied on for atomic single-statement writes only; there
//! is no multi-statement transaction around the check-then-insert sequences
//! in the engine. The dedup guarantees documented here are therefore
//! race-tolerant: the unique index on `new_snapshot_id` and the compaction
//! pass act as backstops for interleavings that slip past the checks.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  change::{Change, ChangeId, ChangeInsert, NewChange},
  snapshot::{NewSnapshot, SiteId, Snapshot, SnapshotId, SnapshotInsert, SnapshotMeta},
};

/// Abstraction over a pagewatch storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MonitorStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Snapshots ─────────────────────────────────────────────────────────

  /// Insert a snapshot with write-path dedup.
  ///
  /// If snapshots for the site already match on `content_hash` OR exact
  /// `content_text`, the most-recently-captured match is returned with
  /// `is_new = false`, and the other matches are deleted unless a change
  /// row references them. Otherwise a new row is written.
  fn insert_snapshot(
    &self,
    input: NewSnapshot,
  ) -> impl Future<Output = Result<SnapshotInsert, Self::Error>> + Send + '_;

  /// The highest-id snapshot for a site, or `None`.
  fn latest_snapshot(
    &self,
    site_id: SiteId,
  ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send + '_;

  /// Retrieve a snapshot by id. Returns `None` if not found.
  fn get_snapshot(
    &self,
    id: SnapshotId,
  ) -> impl Future<Output = Result<Option<Snapshot>, Self::Error>> + Send + '_;

  /// `true` iff a snapshot exists for the site AND an `initial` change has
  /// been recorded for it. The conjunction, not mere snapshot existence,
  /// drives classification: a crash between snapshot insert and change
  /// insert can leave an orphaned snapshot with no recorded `initial`.
  fn has_prior_content(
    &self,
    site_id: SiteId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Changes ───────────────────────────────────────────────────────────

  /// Insert a change row, or resolve to the existing row when another
  /// change already claimed the same `new_snapshot_id` (insert-or-fetch on
  /// the unique index).
  fn insert_change(
    &self,
    input: NewChange,
  ) -> impl Future<Output = Result<ChangeInsert, Self::Error>> + Send + '_;

  /// Any change referencing `new_snapshot_id`, regardless of age.
  fn find_change_by_new_snapshot(
    &self,
    new_snapshot_id: SnapshotId,
  ) -> impl Future<Output = Result<Option<ChangeId>, Self::Error>> + Send + '_;

  /// A change for the same site and `new_snapshot_id` detected at or after
  /// `cutoff` — the narrow race guard layered under the unconditional
  /// lookup.
  fn find_recent_change(
    &self,
    site_id: SiteId,
    new_snapshot_id: SnapshotId,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<ChangeId>, Self::Error>> + Send + '_;

  /// All changes for a site in `detected_at` order (ties broken by id) —
  /// the ordering downstream notification consumers rely on.
  fn changes_for_site(
    &self,
    site_id: SiteId,
    unread_only: bool,
  ) -> impl Future<Output = Result<Vec<Change>, Self::Error>> + Send + '_;

  /// Mark one change read. Returns `false` if the id does not exist.
  fn mark_read(
    &self,
    change_id: ChangeId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Mark every unread change read, optionally for a single site.
  /// Returns the number of rows updated.
  fn mark_all_read(
    &self,
    site_id: Option<SiteId>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Compaction primitives ─────────────────────────────────────────────

  /// Metadata for snapshots captured at or after `cutoff`, ordered by
  /// (site_id, content_hash, captured_at, snapshot_id).
  fn snapshots_since(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<SnapshotMeta>, Self::Error>> + Send + '_;

  /// `true` iff any change references the snapshot as old or new.
  fn snapshot_referenced(
    &self,
    id: SnapshotId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a snapshot. Returns `false` if the id does not exist.
  fn delete_snapshot(
    &self,
    id: SnapshotId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
