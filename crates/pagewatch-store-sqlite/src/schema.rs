//! SQL schema for the pagewatch SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS snapshots (
    snapshot_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id      INTEGER NOT NULL,
    content_hash TEXT NOT NULL,     -- lowercase hex SHA-256
    content_text TEXT NOT NULL,
    full_html    TEXT,
    final_url    TEXT NOT NULL,
    captured_at  TEXT NOT NULL      -- RFC 3339 UTC, microsecond precision
);

CREATE TABLE IF NOT EXISTS changes (
    change_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id         INTEGER NOT NULL,
    old_snapshot_id INTEGER REFERENCES snapshots(snapshot_id),  -- NULL: no prior content
    new_snapshot_id INTEGER NOT NULL REFERENCES snapshots(snapshot_id),
    change_type     TEXT NOT NULL,  -- 'initial' | 'modified'
    old_content     TEXT NOT NULL,
    new_content     TEXT NOT NULL,
    diff_rendered   TEXT NOT NULL,
    detected_at     TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0
);

-- One change per new snapshot. Insert-or-fetch on this index closes the
-- race window left by the check-then-insert duplicate suppression.
CREATE UNIQUE INDEX IF NOT EXISTS changes_new_snapshot_idx
    ON changes(new_snapshot_id);

CREATE INDEX IF NOT EXISTS snapshots_site_hash_idx ON snapshots(site_id, content_hash);
CREATE INDEX IF NOT EXISTS snapshots_captured_idx  ON snapshots(captured_at);
CREATE INDEX IF NOT EXISTS changes_site_idx        ON changes(site_id, detected_at);

PRAGMA user_version = 1;
";
