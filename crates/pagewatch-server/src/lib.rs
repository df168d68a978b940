//! HTTP layer for the pagewatch monitor.
//!
//! Exposes an axum [`Router`] implementing the crawler-facing JSON contract
//! plus the read/mark-read glue, backed by any [`MonitorStore`]. All routes
//! require HTTP Basic auth.

pub mod auth;
pub mod changes;
pub mod compaction;
pub mod error;
pub mod snapshots;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use pagewatch_core::store::MonitorStore;
use pagewatch_engine::Engine;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with
/// `PAGEWATCH_*` environment overrides.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  /// How often the background compaction task runs.
  #[serde(default = "default_compaction_interval_secs")]
  pub compaction_interval_secs: u64,
  /// Trailing window each compaction pass scans.
  #[serde(default = "default_compaction_window_secs")]
  pub compaction_window_secs: u64,
}

fn default_compaction_interval_secs() -> u64 { 600 }
fn default_compaction_window_secs() -> u64 { 600 }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: MonitorStore> {
  pub engine: Arc<Engine<S>>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AuthConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the pagewatch server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: MonitorStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/api/snapshots", post(snapshots::submit::<S>))
    .route("/api/sites/{site_id}/latest-snapshot", get(snapshots::latest::<S>))
    .route("/api/sites/{site_id}/has-prior-content", get(snapshots::has_prior_content::<S>))
    .route("/api/sites/{site_id}/changes", get(changes::list::<S>))
    .route("/api/changes", post(changes::submit::<S>))
    .route("/api/changes/{change_id}/read", post(changes::mark_read::<S>))
    .route("/api/changes/read-all", post(changes::read_all::<S>))
    .route("/api/compact", post(compaction::run::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
