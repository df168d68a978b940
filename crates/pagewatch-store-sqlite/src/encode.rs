//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings at fixed microsecond
//! precision, so lexicographic comparison in SQL matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use pagewatch_core::{
  change::{Change, ChangeType},
  snapshot::{Snapshot, SnapshotMeta},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ChangeType ──────────────────────────────────────────────────────────────

pub fn encode_change_type(t: ChangeType) -> &'static str { t.as_str() }

pub fn decode_change_type(s: &str) -> Result<ChangeType> {
  match s {
    "initial" => Ok(ChangeType::Initial),
    "modified" => Ok(ChangeType::Modified),
    other => Err(Error::UnknownChangeType(other.to_string())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `snapshots` row.
pub struct RawSnapshot {
  pub snapshot_id:  i64,
  pub site_id:      i64,
  pub content_hash: String,
  pub content_text: String,
  pub full_html:    Option<String>,
  pub final_url:    String,
  pub captured_at:  String,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<Snapshot> {
    Ok(Snapshot {
      snapshot_id:  self.snapshot_id,
      site_id:      self.site_id,
      content_hash: self.content_hash,
      content_text: self.content_text,
      full_html:    self.full_html,
      final_url:    self.final_url,
      captured_at:  decode_dt(&self.captured_at)?,
    })
  }
}

/// Raw values read from the metadata columns of a `snapshots` row.
pub struct RawSnapshotMeta {
  pub snapshot_id:  i64,
  pub site_id:      i64,
  pub content_hash: String,
  pub captured_at:  String,
}

impl RawSnapshotMeta {
  pub fn into_meta(self) -> Result<SnapshotMeta> {
    Ok(SnapshotMeta {
      snapshot_id:  self.snapshot_id,
      site_id:      self.site_id,
      content_hash: self.content_hash,
      captured_at:  decode_dt(&self.captured_at)?,
    })
  }
}

/// Raw values read directly from a `changes` row.
pub struct RawChange {
  pub change_id:       i64,
  pub site_id:         i64,
  pub old_snapshot_id: Option<i64>,
  pub new_snapshot_id: i64,
  pub change_type:     String,
  pub old_content:     String,
  pub new_content:     String,
  pub diff_rendered:   String,
  pub detected_at:     String,
  pub is_read:         bool,
}

impl RawChange {
  pub fn into_change(self) -> Result<Change> {
    Ok(Change {
      change_id:       self.change_id,
      site_id:         self.site_id,
      old_snapshot_id: self.old_snapshot_id,
      new_snapshot_id: self.new_snapshot_id,
      change_type:     decode_change_type(&self.change_type)?,
      old_content:     self.old_content,
      new_content:     self.new_content,
      diff_rendered:   self.diff_rendered,
      detected_at:     decode_dt(&self.detected_at)?,
      is_read:         self.is_read,
    })
  }
}
