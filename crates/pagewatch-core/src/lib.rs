//! Core types and trait definitions for the pagewatch change monitor.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod change;
pub mod content;
pub mod error;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
