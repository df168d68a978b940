//! Validation errors for `pagewatch-core`.
//!
//! These are rejected before any storage access and are never retryable;
//! storage-level failures live in the store crate's own error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid site id: {0} (must be positive)")]
  InvalidSiteId(i64),

  #[error("invalid snapshot id: {0} (must be positive)")]
  InvalidSnapshotId(i64),

  #[error("unknown snapshot id: {0}")]
  UnknownSnapshot(i64),

  #[error("malformed content hash: {0:?} (expected 64 hex characters)")]
  MalformedContentHash(String),

  #[error("final_url must not be empty")]
  EmptyFinalUrl,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
