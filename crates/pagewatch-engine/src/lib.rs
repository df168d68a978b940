//! The pagewatch decision layer: snapshot intake, change classification,
//! duplicate suppression, and the compaction pass.
//!
//! Generic over any [`pagewatch_core::store::MonitorStore`] backend. Every
//! accept, skip, and delete decision emits a `tracing` event so the write
//! history of a site can be reconstructed from logs alone.

pub mod compact;
pub mod error;
pub mod ingest;

pub use compact::CompactionReport;
pub use error::{Error, Result};
pub use ingest::{
  ChangeOutcome, ChangeSubmission, DUPLICATE_WINDOW_SECS, Engine, SnapshotOutcome,
  SnapshotSubmission,
};

#[cfg(test)]
mod tests;
