//! Handlers for change submission and the read/unread glue used by
//! downstream notification consumers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/changes` | Body: [`ChangeBody`]; suppression is a success |
//! | `GET`  | `/api/sites/:site_id/changes` | `?unread_only=true` to filter |
//! | `POST` | `/api/changes/:change_id/read` | 204, or 404 for an unknown id |
//! | `POST` | `/api/changes/read-all` | Optional `site_id` in the body |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use pagewatch_core::{
  change::{Change, ChangeId, ChangeType},
  snapshot::{SiteId, SnapshotId},
  store::MonitorStore,
};
use pagewatch_engine::ChangeSubmission;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// JSON body accepted by `POST /api/changes`.
#[derive(Debug, Deserialize)]
pub struct ChangeBody {
  pub site_id:         SiteId,
  pub old_snapshot_id: Option<SnapshotId>,
  pub new_snapshot_id: SnapshotId,
  /// Advisory; the server reclassifies from durable state.
  pub change_type:     Option<ChangeType>,
  #[serde(default)]
  pub old_content:     String,
  pub new_content:     String,
}

#[derive(Debug, Serialize)]
pub struct ChangeResponse {
  pub change_id:    ChangeId,
  pub change_type:  ChangeType,
  pub deduplicated: bool,
  pub truncated:    bool,
}

/// `POST /api/changes`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<ChangeBody>,
) -> Result<Json<ChangeResponse>, ApiError>
where
  S: MonitorStore + Clone + Send + Sync + 'static,
{
  let outcome = state
    .engine
    .submit_change(ChangeSubmission {
      site_id:         body.site_id,
      old_snapshot_id: body.old_snapshot_id,
      new_snapshot_id: body.new_snapshot_id,
      change_type:     body.change_type,
      old_content:     body.old_content,
      new_content:     body.new_content,
    })
    .await?;

  Ok(Json(ChangeResponse {
    change_id:    outcome.change_id,
    change_type:  outcome.change_type,
    deduplicated: outcome.deduplicated,
    truncated:    outcome.truncated,
  }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub unread_only: bool,
}

/// `GET /api/sites/:site_id/changes[?unread_only=true]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(site_id): Path<SiteId>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Change>>, ApiError>
where
  S: MonitorStore + Clone + Send + Sync + 'static,
{
  let changes = state
    .engine
    .store()
    .changes_for_site(site_id, params.unread_only)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(changes))
}

/// `POST /api/changes/:change_id/read`
pub async fn mark_read<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Path(change_id): Path<ChangeId>,
) -> Result<StatusCode, ApiError>
where
  S: MonitorStore + Clone + Send + Sync + 'static,
{
  let updated = state
    .engine
    .store()
    .mark_read(change_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if updated {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("change {change_id} not found")))
  }
}

/// JSON body accepted by `POST /api/changes/read-all`. An empty object means
/// "all sites".
#[derive(Debug, Deserialize)]
pub struct ReadAllBody {
  pub site_id: Option<SiteId>,
}

/// `POST /api/changes/read-all`
pub async fn read_all<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
  Json(body): Json<ReadAllBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: MonitorStore + Clone + Send + Sync + 'static,
{
  let updated = state
    .engine
    .store()
    .mark_all_read(body.site_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(json!({ "updated": updated })))
}
