//! Handlers for snapshot intake and snapshot reads.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/snapshots` | Body: [`SnapshotBody`]; dedup is a success |
//! | `GET`  | `/api/sites/:site_id/latest-snapshot` | 404 when the site has none |
//! | `GET`  | `/api/sites/:site_id/has-prior-content` | Classification preview |

use axum::{
  Json,
  extract::{Path, State},
};
use pagewatch_core::{
  snapshot::{SiteId, Snapshot, SnapshotId},
  store::MonitorStore,
};
use pagewatch_engine::SnapshotSubmission;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// JSON body accepted by `POST /api/snapshots`.
#[derive(Debug, Deserialize)]
pub struct SnapshotBody {
  pub site_id:      SiteId,
  /// Raw extracted page text.
  pub content:      String,
  /// Optional crawler-computed fingerprint; computed server-side when absent.
  pub content_hash: Option<String>,
  pub full_html:    Option<String>,
  pub final_url:    String,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
  pub snapshot_id:       SnapshotId,
  pub is_new:            bool,
  pub has_prior_content: bool,
}

/// `POST /api/snapshots`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<SnapshotBody>,
) -> Result<Json<SnapshotResponse>, ApiError>
where
  S: MonitorStore + Clone + Send + Sync + 'static,
{
  let outcome = state
    .engine
    .submit_snapshot(SnapshotSubmission {
      site_id:      body.site_id,
      content:      body.content,
      content_hash: body.content_hash,
      full_html:    body.full_html,
      final_url:    body.final_url,
    })
    .await?;

  Ok(Json(SnapshotResponse {
    snapshot_id:       outcome.snapshot_id,
    is_new:            outcome.is_new,
    has_prior_content: outcome.has_prior_content,
  }))
}

/// `GET /api/sites/:site_id/latest-snapshot`
pub async fn latest<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(site_id): Path<SiteId>,
) -> Result<Json<Snapshot>, ApiError>
where
  S: MonitorStore + Clone + Send + Sync + 'static,
{
  let snapshot = state
    .engine
    .store()
    .latest_snapshot(site_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("no snapshot for site {site_id}")))?;
  Ok(Json(snapshot))
}

/// `GET /api/sites/:site_id/has-prior-content`
pub async fn has_prior_content<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(site_id): Path<SiteId>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: MonitorStore + Clone + Send + Sync + 'static,
{
  let prior = state
    .engine
    .store()
    .has_prior_content(site_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(json!({ "has_prior_content": prior })))
}
