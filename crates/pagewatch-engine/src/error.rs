//! Error type for the engine layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Input the caller must fix; never worth retrying.
  #[error("validation error: {0}")]
  Validation(#[from] pagewatch_core::Error),

  /// Backend failure; the operation is safe to retry as submitted.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
