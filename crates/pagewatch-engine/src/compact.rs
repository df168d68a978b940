//! Periodic compaction of racing snapshot writes.
//!
//! A housekeeping backstop, not a correctness requirement: the write-path
//! dedup and the unique change constraint already close the main races.
//! Compaction sweeps up identical-content snapshot rows that concurrent
//! crawler runs managed to write anyway.

use chrono::{Duration, Utc};
use pagewatch_core::{snapshot::SnapshotMeta, store::MonitorStore};
use tracing::{debug, info};

use crate::{Engine, Error, Result};

/// Outcome of one compaction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionReport {
  /// Snapshots captured inside the window.
  pub scanned: usize,
  /// Duplicate rows deleted.
  pub deleted: usize,
}

impl<S: MonitorStore> Engine<S> {
  /// Compact snapshots captured within the trailing `window`.
  ///
  /// Within each `(site_id, content_hash)` group the oldest row is kept and
  /// the rest are deleted, except rows referenced by a change, which are
  /// never touched.
  pub async fn compact(&self, window: Duration) -> Result<CompactionReport> {
    let cutoff = Utc::now() - window;
    let metas = self
      .store()
      .snapshots_since(cutoff)
      .await
      .map_err(Error::storage)?;
    let scanned = metas.len();
    let mut deleted = 0usize;

    // Rows arrive ordered by (site_id, content_hash, captured_at, id), so
    // each group is contiguous and its first row is the one to keep.
    let mut kept: Option<(i64, String)> = None;
    for meta in metas {
      let group = (meta.site_id, meta.content_hash.clone());
      if kept.as_ref() != Some(&group) {
        kept = Some(group);
        continue;
      }
      if self.delete_duplicate(&meta).await? {
        deleted += 1;
      }
    }

    info!(scanned, deleted, window_secs = window.num_seconds(), "compaction pass finished");
    Ok(CompactionReport { scanned, deleted })
  }

  async fn delete_duplicate(&self, meta: &SnapshotMeta) -> Result<bool> {
    if self
      .store()
      .snapshot_referenced(meta.snapshot_id)
      .await
      .map_err(Error::storage)?
    {
      debug!(
        site_id = meta.site_id,
        snapshot_id = meta.snapshot_id,
        "duplicate snapshot kept: referenced by a change"
      );
      return Ok(false);
    }

    let deleted = self
      .store()
      .delete_snapshot(meta.snapshot_id)
      .await
      .map_err(Error::storage)?;
    if deleted {
      info!(
        site_id = meta.site_id,
        snapshot_id = meta.snapshot_id,
        "duplicate snapshot deleted by compaction"
      );
    }
    Ok(deleted)
  }
}
