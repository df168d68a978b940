//! Snapshot — one captured observation of a monitored page.
//!
//! Snapshots are immutable once written. They are deleted only by the
//! write-path dedup or the compaction pass, and never while a change row
//! references them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, content};

pub type SiteId = i64;
pub type SnapshotId = i64;

/// A persisted snapshot row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
  pub snapshot_id:  SnapshotId,
  pub site_id:      SiteId,
  /// Lowercase hex SHA-256 of the canonical content text.
  pub content_hash: String,
  pub content_text: String,
  /// Raw page payload, when the crawler chose to send it.
  pub full_html:    Option<String>,
  /// URL the crawler ended up on after redirects.
  pub final_url:    String,
  pub captured_at:  DateTime<Utc>,
}

/// Input for [`MonitorStore::insert_snapshot`](crate::store::MonitorStore).
/// `captured_at` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSnapshot {
  pub site_id:      SiteId,
  pub content_hash: String,
  pub content_text: String,
  pub full_html:    Option<String>,
  pub final_url:    String,
}

impl NewSnapshot {
  /// Reject malformed input before it reaches storage.
  pub fn validate(&self) -> Result<(), Error> {
    if self.site_id <= 0 {
      return Err(Error::InvalidSiteId(self.site_id));
    }
    if !content::is_valid_hash(&self.content_hash) {
      return Err(Error::MalformedContentHash(self.content_hash.clone()));
    }
    if self.final_url.trim().is_empty() {
      return Err(Error::EmptyFinalUrl);
    }
    Ok(())
  }
}

/// Result of a snapshot insert: either a freshly written row or an existing
/// one the input deduplicated against.
#[derive(Debug, Clone)]
pub struct SnapshotInsert {
  pub snapshot: Snapshot,
  /// `false` when the content matched an existing snapshot for the site.
  pub is_new:   bool,
}

/// Light metadata row used by the compaction pass; omits the content text so
/// a window scan does not drag page bodies through memory.
#[derive(Debug, Clone)]
pub struct SnapshotMeta {
  pub snapshot_id:  SnapshotId,
  pub site_id:      SiteId,
  pub content_hash: String,
  pub captured_at:  DateTime<Utc>,
}
