//! Change — a recorded transition between two snapshots, with its rendered
//! diff. Created exactly once per distinct content transition; the core
//! never deletes change rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  snapshot::{SiteId, SnapshotId},
};

pub type ChangeId = i64;

/// Whether a change is a site's first recorded content or a later edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
  /// First accepted content for a site with no `initial` change yet.
  /// Always carries `old_snapshot_id = None`.
  Initial,
  /// Any subsequent content transition.
  Modified,
}

impl ChangeType {
  pub fn as_str(self) -> &'static str {
    match self {
      ChangeType::Initial => "initial",
      ChangeType::Modified => "modified",
    }
  }
}

/// A persisted change row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
  pub change_id:       ChangeId,
  pub site_id:         SiteId,
  /// `None` means "no prior content" — only valid for `Initial`.
  pub old_snapshot_id: Option<SnapshotId>,
  pub new_snapshot_id: SnapshotId,
  pub change_type:     ChangeType,
  pub old_content:     String,
  pub new_content:     String,
  /// Annotated HTML diff, possibly truncated to the render budget.
  pub diff_rendered:   String,
  pub detected_at:     DateTime<Utc>,
  pub is_read:         bool,
}

/// Input for [`MonitorStore::insert_change`](crate::store::MonitorStore).
/// `detected_at` is assigned by the store; `is_read` starts false.
#[derive(Debug, Clone)]
pub struct NewChange {
  pub site_id:         SiteId,
  pub old_snapshot_id: Option<SnapshotId>,
  pub new_snapshot_id: SnapshotId,
  pub change_type:     ChangeType,
  pub old_content:     String,
  pub new_content:     String,
  pub diff_rendered:   String,
}

impl NewChange {
  pub fn validate(&self) -> Result<(), Error> {
    if self.site_id <= 0 {
      return Err(Error::InvalidSiteId(self.site_id));
    }
    if self.new_snapshot_id <= 0 {
      return Err(Error::InvalidSnapshotId(self.new_snapshot_id));
    }
    if let Some(old) = self.old_snapshot_id
      && old <= 0
    {
      return Err(Error::InvalidSnapshotId(old));
    }
    Ok(())
  }
}

/// Result of a change insert: either a freshly written row or the existing
/// row that already claimed the same `new_snapshot_id`.
#[derive(Debug, Clone)]
pub struct ChangeInsert {
  pub change:       Change,
  /// `true` when the unique index resolved the insert to an existing row.
  pub deduplicated: bool,
}
