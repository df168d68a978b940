//! Manual compaction trigger.

use axum::{Json, extract::State};
use chrono::Duration;
use pagewatch_core::store::MonitorStore;
use serde_json::json;

use crate::{AppState, auth::Authenticated, error::ApiError};

/// `POST /api/compact` — run one compaction pass over the configured window
/// and report what it did. The same pass also runs on the server's internal
/// timer; this endpoint exists for operators and tests.
pub async fn run<S>(
  State(state): State<AppState<S>>,
  _auth: Authenticated,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: MonitorStore + Clone + Send + Sync + 'static,
{
  let window = Duration::seconds(state.config.compaction_window_secs as i64);
  let report = state.engine.compact(window).await?;
  Ok(Json(json!({ "scanned": report.scanned, "deleted": report.deleted })))
}
