//! Snapshot intake and change classification.
//!
//! The change type is always recomputed from durable state
//! (`has_prior_content`), never from anything cached in process memory; a
//! crawler's `change_type` hint is advisory and a mismatch only logs.

use chrono::{Duration, Utc};
use pagewatch_core::{
  Error as CoreError, content,
  change::{ChangeId, ChangeType, NewChange},
  snapshot::{NewSnapshot, SiteId, SnapshotId},
  store::MonitorStore,
};
use tracing::{info, warn};

use crate::{Error, Result};

/// Rule-2 duplicate suppression window: a change for the same site and new
/// snapshot recorded within this many seconds is treated as a retry.
pub const DUPLICATE_WINDOW_SECS: i64 = 10;

/// A crawler's snapshot submission.
#[derive(Debug, Clone)]
pub struct SnapshotSubmission {
  pub site_id:      SiteId,
  /// Raw extracted page text; canonicalised before storage.
  pub content:      String,
  /// Crawler-computed fingerprint. When absent the engine hashes the
  /// canonical text itself.
  pub content_hash: Option<String>,
  pub full_html:    Option<String>,
  pub final_url:    String,
}

/// Result of a snapshot submission.
#[derive(Debug, Clone)]
pub struct SnapshotOutcome {
  pub snapshot_id:       SnapshotId,
  pub is_new:            bool,
  /// Whether the site now has recorded history; drives the crawler's
  /// initial-vs-modified decision for the follow-up change submission.
  pub has_prior_content: bool,
}

/// A crawler's change submission.
#[derive(Debug, Clone)]
pub struct ChangeSubmission {
  pub site_id:         SiteId,
  pub old_snapshot_id: Option<SnapshotId>,
  pub new_snapshot_id: SnapshotId,
  /// Advisory; the engine reclassifies from durable state.
  pub change_type:     Option<ChangeType>,
  pub old_content:     String,
  pub new_content:     String,
}

/// Result of a change submission. Duplicate suppression is a success
/// carrying the existing row's id, not an error.
#[derive(Debug, Clone)]
pub struct ChangeOutcome {
  pub change_id:    ChangeId,
  pub change_type:  ChangeType,
  pub deduplicated: bool,
  pub truncated:    bool,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The decision layer over a [`MonitorStore`] backend.
#[derive(Clone)]
pub struct Engine<S> {
  store:         S,
  render_budget: usize,
}

impl<S: MonitorStore> Engine<S> {
  pub fn new(store: S) -> Self {
    Self { store, render_budget: pagewatch_diff::DEFAULT_RENDER_BUDGET }
  }

  /// Override the diff render budget (bytes). Mostly useful in tests.
  pub fn with_render_budget(mut self, budget: usize) -> Self {
    self.render_budget = budget;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  /// Accept a snapshot: canonicalise, fingerprint, dedup against existing
  /// rows, and report whether the site has prior recorded history.
  pub async fn submit_snapshot(&self, submission: SnapshotSubmission) -> Result<SnapshotOutcome> {
    let normalized = content::normalize(&submission.content);

    // A crawler-supplied hash wins so its retries stay self-consistent, but
    // disagreement with our own fingerprint is worth a log line.
    let content_hash = match submission.content_hash {
      Some(provided) => {
        if provided != normalized.content_hash {
          warn!(
            site_id = submission.site_id,
            provided = %provided,
            computed = %normalized.content_hash,
            "submitted content hash disagrees with canonical fingerprint"
          );
        }
        provided
      }
      None => normalized.content_hash,
    };

    let input = NewSnapshot {
      site_id: submission.site_id,
      content_hash,
      content_text: normalized.content_text,
      full_html: submission.full_html,
      final_url: submission.final_url,
    };
    input.validate()?;

    let inserted = self
      .store
      .insert_snapshot(input)
      .await
      .map_err(Error::storage)?;
    let snapshot_id = inserted.snapshot.snapshot_id;

    if inserted.is_new {
      info!(site_id = inserted.snapshot.site_id, snapshot_id, "snapshot accepted");
    } else {
      info!(
        site_id = inserted.snapshot.site_id,
        snapshot_id, "snapshot matched existing content, resolved to stored row"
      );
    }

    let has_prior_content = self
      .store
      .has_prior_content(inserted.snapshot.site_id)
      .await
      .map_err(Error::storage)?;

    Ok(SnapshotOutcome { snapshot_id, is_new: inserted.is_new, has_prior_content })
  }

  /// Record a change: reclassify from durable state, suppress duplicates,
  /// diff the submitted texts, and persist the rendered result.
  pub async fn submit_change(&self, submission: ChangeSubmission) -> Result<ChangeOutcome> {
    validate_submission(&submission)?;

    // Both referenced snapshots must exist; a dangling id is caller error,
    // not a storage fault.
    self.require_snapshot(submission.new_snapshot_id).await?;
    if let Some(old_id) = submission.old_snapshot_id {
      self.require_snapshot(old_id).await?;
    }

    let prior = self
      .store
      .has_prior_content(submission.site_id)
      .await
      .map_err(Error::storage)?;
    let change_type = if prior { ChangeType::Modified } else { ChangeType::Initial };

    if let Some(hint) = submission.change_type
      && hint != change_type
    {
      warn!(
        site_id = submission.site_id,
        hinted = hint.as_str(),
        classified = change_type.as_str(),
        "change type hint overridden by durable state"
      );
    }

    match change_type {
      ChangeType::Initial => self.record_initial(submission).await,
      ChangeType::Modified => self.record_modified(submission).await,
    }
  }

  /// First recorded content: no prior snapshot to diff against, and the
  /// suppression rules are skipped so a site can never get stuck without an
  /// `initial` row. The unique index still collapses retried submissions.
  async fn record_initial(&self, submission: ChangeSubmission) -> Result<ChangeOutcome> {
    if submission.old_snapshot_id.is_some() {
      warn!(
        site_id = submission.site_id,
        "old snapshot reference on an initial change ignored"
      );
    }

    let rendered = self.render_diff("", &submission.new_content);
    let inserted = self
      .store
      .insert_change(NewChange {
        site_id:         submission.site_id,
        old_snapshot_id: None,
        new_snapshot_id: submission.new_snapshot_id,
        change_type:     ChangeType::Initial,
        old_content:     String::new(),
        new_content:     submission.new_content,
        diff_rendered:   rendered.html,
      })
      .await
      .map_err(Error::storage)?;

    info!(
      site_id = submission.site_id,
      change_id = inserted.change.change_id,
      new_snapshot_id = submission.new_snapshot_id,
      deduplicated = inserted.deduplicated,
      "initial change recorded"
    );
    Ok(ChangeOutcome {
      change_id:    inserted.change.change_id,
      change_type:  ChangeType::Initial,
      deduplicated: inserted.deduplicated,
      truncated:    rendered.truncated,
    })
  }

  async fn record_modified(&self, submission: ChangeSubmission) -> Result<ChangeOutcome> {
    // Rule 1: any change already claiming this new snapshot, regardless of
    // age, means this submission is a replay.
    if let Some(existing) = self
      .store
      .find_change_by_new_snapshot(submission.new_snapshot_id)
      .await
      .map_err(Error::storage)?
    {
      info!(
        site_id = submission.site_id,
        change_id = existing,
        new_snapshot_id = submission.new_snapshot_id,
        "change suppressed: snapshot already claimed by an existing change"
      );
      return Ok(deduplicated_outcome(existing));
    }

    // Rule 2: a near-simultaneous change for the same site and snapshot is
    // a racing crawler run.
    let cutoff = Utc::now() - Duration::seconds(DUPLICATE_WINDOW_SECS);
    if let Some(existing) = self
      .store
      .find_recent_change(submission.site_id, submission.new_snapshot_id, cutoff)
      .await
      .map_err(Error::storage)?
    {
      info!(
        site_id = submission.site_id,
        change_id = existing,
        new_snapshot_id = submission.new_snapshot_id,
        "change suppressed: concurrent duplicate within the suppression window"
      );
      return Ok(deduplicated_outcome(existing));
    }

    let rendered = self.render_diff(&submission.old_content, &submission.new_content);
    let inserted = self
      .store
      .insert_change(NewChange {
        site_id:         submission.site_id,
        old_snapshot_id: submission.old_snapshot_id,
        new_snapshot_id: submission.new_snapshot_id,
        change_type:     ChangeType::Modified,
        old_content:     submission.old_content,
        new_content:     submission.new_content,
        diff_rendered:   rendered.html,
      })
      .await
      .map_err(Error::storage)?;

    if inserted.deduplicated {
      // The checks above raced another writer; the unique index resolved it.
      info!(
        site_id = submission.site_id,
        change_id = inserted.change.change_id,
        new_snapshot_id = submission.new_snapshot_id,
        "change suppressed at insert by unique snapshot constraint"
      );
    } else {
      info!(
        site_id = submission.site_id,
        change_id = inserted.change.change_id,
        new_snapshot_id = submission.new_snapshot_id,
        truncated = rendered.truncated,
        "modified change recorded"
      );
    }
    Ok(ChangeOutcome {
      change_id:    inserted.change.change_id,
      change_type:  ChangeType::Modified,
      deduplicated: inserted.deduplicated,
      truncated:    rendered.truncated,
    })
  }

  fn render_diff(&self, old: &str, new: &str) -> pagewatch_diff::Rendered {
    let segments = pagewatch_diff::diff(old, new);
    let rendered = pagewatch_diff::render_html(&segments, self.render_budget);
    if rendered.truncated {
      warn!(
        total_bytes = rendered.total_bytes,
        budget = self.render_budget,
        "diff render exceeded budget and was truncated"
      );
    }
    rendered
  }

  async fn require_snapshot(&self, id: SnapshotId) -> Result<()> {
    match self.store.get_snapshot(id).await.map_err(Error::storage)? {
      Some(_) => Ok(()),
      None => Err(CoreError::UnknownSnapshot(id).into()),
    }
  }
}

fn validate_submission(submission: &ChangeSubmission) -> Result<()> {
  if submission.site_id <= 0 {
    return Err(CoreError::InvalidSiteId(submission.site_id).into());
  }
  if submission.new_snapshot_id <= 0 {
    return Err(CoreError::InvalidSnapshotId(submission.new_snapshot_id).into());
  }
  if let Some(old) = submission.old_snapshot_id
    && old <= 0
  {
    return Err(CoreError::InvalidSnapshotId(old).into());
  }
  Ok(())
}

fn deduplicated_outcome(change_id: ChangeId) -> ChangeOutcome {
  ChangeOutcome {
    change_id,
    change_type: ChangeType::Modified,
    deduplicated: true,
    truncated: false,
  }
}
