//! Word-level diff engine for page content.
//!
//! Tokenizes text with a Unicode-aware rule, builds the classic LCS table,
//! and backtracks to an annotated segment list in old-text order. The O(m·n)
//! table is acceptable because inputs are page-sized, not streams.

mod diff;
mod render;
mod tokenize;

pub use diff::diff;
pub use render::{DEFAULT_RENDER_BUDGET, Rendered, render_html};
pub use tokenize::tokenize;

use serde::{Deserialize, Serialize};

/// How a token relates the old text to the new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
  Unchanged,
  Added,
  Removed,
}

/// One token of diff output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
  pub kind: SegmentKind,
  pub text: String,
}

impl Segment {
  pub(crate) fn new(kind: SegmentKind, text: &str) -> Self {
    Segment { kind, text: text.to_string() }
  }
}
