//! [`SqliteStore`] — the SQLite implementation of [`MonitorStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use pagewatch_core::{
  change::{ChangeId, ChangeInsert, NewChange},
  snapshot::{NewSnapshot, SiteId, Snapshot, SnapshotId, SnapshotInsert, SnapshotMeta},
  store::MonitorStore,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{RawChange, RawSnapshot, RawSnapshotMeta, encode_change_type, encode_dt},
  schema::SCHEMA,
};

const SNAPSHOT_COLUMNS: &str =
  "snapshot_id, site_id, content_hash, content_text, full_html, final_url, captured_at";

const CHANGE_COLUMNS: &str = "change_id, site_id, old_snapshot_id, new_snapshot_id, change_type, \
                              old_content, new_content, diff_rendered, detected_at, is_read";

fn snapshot_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawSnapshot> {
  Ok(RawSnapshot {
    snapshot_id:  row.get(0)?,
    site_id:      row.get(1)?,
    content_hash: row.get(2)?,
    content_text: row.get(3)?,
    full_html:    row.get(4)?,
    final_url:    row.get(5)?,
    captured_at:  row.get(6)?,
  })
}

fn change_from_row(row: &rusqlite::Row) -> rusqlite::Result<RawChange> {
  Ok(RawChange {
    change_id:       row.get(0)?,
    site_id:         row.get(1)?,
    old_snapshot_id: row.get(2)?,
    new_snapshot_id: row.get(3)?,
    change_type:     row.get(4)?,
    old_content:     row.get(5)?,
    new_content:     row.get(6)?,
    diff_rendered:   row.get(7)?,
    detected_at:     row.get(8)?,
    is_read:         row.get(9)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A pagewatch monitor store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// multi-step sequences (dedup-insert, insert-or-fetch) run inside a single
/// `call` closure, so they are serialised on the store's connection.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a snapshot row directly, bypassing the write-path dedup.
  ///
  /// Exists so tests can stage the duplicate rows that normally only arise
  /// from racing writers; not part of the [`MonitorStore`] contract.
  pub async fn insert_snapshot_unchecked(&self, input: NewSnapshot) -> Result<SnapshotId> {
    let at_str = encode_dt(Utc::now());
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO snapshots (site_id, content_hash, content_text, full_html, final_url, captured_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            input.site_id,
            input.content_hash,
            input.content_text,
            input.full_html,
            input.final_url,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }
}

// ─── MonitorStore impl ───────────────────────────────────────────────────────

impl MonitorStore for SqliteStore {
  type Error = Error;

  // ── Snapshots ─────────────────────────────────────────────────────────────

  async fn insert_snapshot(&self, input: NewSnapshot) -> Result<SnapshotInsert> {
    let at_str = encode_dt(Utc::now());

    let (raw, is_new): (RawSnapshot, bool) = self
      .conn
      .call(move |conn| {
        // Existing snapshots matching on hash OR exact text, newest first.
        let mut stmt = conn.prepare(
          "SELECT snapshot_id FROM snapshots
           WHERE site_id = ?1 AND (content_hash = ?2 OR content_text = ?3)
           ORDER BY captured_at DESC, snapshot_id DESC",
        )?;
        let matches: Vec<i64> = stmt
          .query_map(
            rusqlite::params![input.site_id, input.content_hash, input.content_text],
            |row| row.get(0),
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        if let Some(&keep_id) = matches.first() {
          // Resolve to the most-recently-captured match; delete the rest
          // unless a change row references them.
          for &dup_id in &matches[1..] {
            conn.execute(
              "DELETE FROM snapshots
               WHERE snapshot_id = ?1
                 AND NOT EXISTS (
                   SELECT 1 FROM changes
                   WHERE old_snapshot_id = ?1 OR new_snapshot_id = ?1
                 )",
              rusqlite::params![dup_id],
            )?;
          }

          let raw = conn.query_row(
            &format!("SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE snapshot_id = ?1"),
            rusqlite::params![keep_id],
            snapshot_from_row,
          )?;
          return Ok((raw, false));
        }

        conn.execute(
          "INSERT INTO snapshots (site_id, content_hash, content_text, full_html, final_url, captured_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            input.site_id,
            input.content_hash,
            input.content_text,
            input.full_html,
            input.final_url,
            at_str,
          ],
        )?;
        let id = conn.last_insert_rowid();
        let raw = conn.query_row(
          &format!("SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE snapshot_id = ?1"),
          rusqlite::params![id],
          snapshot_from_row,
        )?;
        Ok((raw, true))
      })
      .await?;

    Ok(SnapshotInsert { snapshot: raw.into_snapshot()?, is_new })
  }

  async fn latest_snapshot(&self, site_id: SiteId) -> Result<Option<Snapshot>> {
    let raw: Option<RawSnapshot> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SNAPSHOT_COLUMNS} FROM snapshots
                 WHERE site_id = ?1
                 ORDER BY snapshot_id DESC LIMIT 1"
              ),
              rusqlite::params![site_id],
              snapshot_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSnapshot::into_snapshot).transpose()
  }

  async fn get_snapshot(&self, id: SnapshotId) -> Result<Option<Snapshot>> {
    let raw: Option<RawSnapshot> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE snapshot_id = ?1"),
              rusqlite::params![id],
              snapshot_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSnapshot::into_snapshot).transpose()
  }

  async fn has_prior_content(&self, site_id: SiteId) -> Result<bool> {
    let prior = self
      .conn
      .call(move |conn| {
        let prior: bool = conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM snapshots WHERE site_id = ?1)
              AND EXISTS(SELECT 1 FROM changes
                         WHERE site_id = ?1 AND change_type = 'initial')",
          rusqlite::params![site_id],
          |row| row.get(0),
        )?;
        Ok(prior)
      })
      .await?;
    Ok(prior)
  }

  // ── Changes ───────────────────────────────────────────────────────────────

  async fn insert_change(&self, input: NewChange) -> Result<ChangeInsert> {
    let at_str = encode_dt(Utc::now());
    let type_str = encode_change_type(input.change_type).to_owned();

    let (raw, deduplicated): (RawChange, bool) = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO changes
             (site_id, old_snapshot_id, new_snapshot_id, change_type,
              old_content, new_content, diff_rendered, detected_at, is_read)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
           ON CONFLICT(new_snapshot_id) DO NOTHING",
          rusqlite::params![
            input.site_id,
            input.old_snapshot_id,
            input.new_snapshot_id,
            type_str,
            input.old_content,
            input.new_content,
            input.diff_rendered,
            at_str,
          ],
        )?;

        // Inserted or not, the row holding this new_snapshot_id is the
        // authoritative one.
        let raw = conn.query_row(
          &format!("SELECT {CHANGE_COLUMNS} FROM changes WHERE new_snapshot_id = ?1"),
          rusqlite::params![input.new_snapshot_id],
          change_from_row,
        )?;
        Ok((raw, inserted == 0))
      })
      .await?;

    Ok(ChangeInsert { change: raw.into_change()?, deduplicated })
  }

  async fn find_change_by_new_snapshot(
    &self,
    new_snapshot_id: SnapshotId,
  ) -> Result<Option<ChangeId>> {
    let id = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT change_id FROM changes WHERE new_snapshot_id = ?1 LIMIT 1",
              rusqlite::params![new_snapshot_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(id)
  }

  async fn find_recent_change(
    &self,
    site_id: SiteId,
    new_snapshot_id: SnapshotId,
    cutoff: DateTime<Utc>,
  ) -> Result<Option<ChangeId>> {
    let cutoff_str = encode_dt(cutoff);
    let id = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT change_id FROM changes
               WHERE site_id = ?1 AND new_snapshot_id = ?2 AND detected_at >= ?3
               ORDER BY detected_at DESC LIMIT 1",
              rusqlite::params![site_id, new_snapshot_id, cutoff_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(id)
  }

  async fn changes_for_site(
    &self,
    site_id: SiteId,
    unread_only: bool,
  ) -> Result<Vec<pagewatch_core::change::Change>> {
    let raws: Vec<RawChange> = self
      .conn
      .call(move |conn| {
        let sql = if unread_only {
          format!(
            "SELECT {CHANGE_COLUMNS} FROM changes
             WHERE site_id = ?1 AND is_read = 0
             ORDER BY detected_at ASC, change_id ASC"
          )
        } else {
          format!(
            "SELECT {CHANGE_COLUMNS} FROM changes
             WHERE site_id = ?1
             ORDER BY detected_at ASC, change_id ASC"
          )
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![site_id], change_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChange::into_change).collect()
  }

  async fn mark_read(&self, change_id: ChangeId) -> Result<bool> {
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE changes SET is_read = 1 WHERE change_id = ?1",
          rusqlite::params![change_id],
        )?)
      })
      .await?;
    Ok(updated > 0)
  }

  async fn mark_all_read(&self, site_id: Option<SiteId>) -> Result<usize> {
    let updated = self
      .conn
      .call(move |conn| {
        let updated = match site_id {
          Some(site) => conn.execute(
            "UPDATE changes SET is_read = 1 WHERE is_read = 0 AND site_id = ?1",
            rusqlite::params![site],
          )?,
          None => conn.execute("UPDATE changes SET is_read = 1 WHERE is_read = 0", [])?,
        };
        Ok(updated)
      })
      .await?;
    Ok(updated)
  }

  // ── Compaction primitives ─────────────────────────────────────────────────

  async fn snapshots_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<SnapshotMeta>> {
    let cutoff_str = encode_dt(cutoff);
    let raws: Vec<RawSnapshotMeta> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT snapshot_id, site_id, content_hash, captured_at FROM snapshots
           WHERE captured_at >= ?1
           ORDER BY site_id, content_hash, captured_at, snapshot_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![cutoff_str], |row| {
            Ok(RawSnapshotMeta {
              snapshot_id:  row.get(0)?,
              site_id:      row.get(1)?,
              content_hash: row.get(2)?,
              captured_at:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSnapshotMeta::into_meta).collect()
  }

  async fn snapshot_referenced(&self, id: SnapshotId) -> Result<bool> {
    let referenced = self
      .conn
      .call(move |conn| {
        let referenced: bool = conn.query_row(
          "SELECT EXISTS(SELECT 1 FROM changes
                         WHERE old_snapshot_id = ?1 OR new_snapshot_id = ?1)",
          rusqlite::params![id],
          |row| row.get(0),
        )?;
        Ok(referenced)
      })
      .await?;
    Ok(referenced)
  }

  async fn delete_snapshot(&self, id: SnapshotId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM snapshots WHERE snapshot_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }
}
