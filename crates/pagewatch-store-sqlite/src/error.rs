//! Error type for `pagewatch-store-sqlite`.
//!
//! These surface to callers as the retryable storage failure class: every
//! write behind them is either dedup-guarded or uniquely keyed, so a retry
//! after a connection failure converges instead of duplicating.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] pagewatch_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown change type in storage: {0:?}")]
  UnknownChangeType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
