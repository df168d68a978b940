//! Render a segment list as annotated HTML for the review UI.

use std::fmt::Write as _;

use crate::{Segment, SegmentKind};

/// Cap on rendered output: 50 MB. A safety valve against pathological page
/// payloads, not a correctness requirement.
pub const DEFAULT_RENDER_BUDGET: usize = 50 * 1024 * 1024;

/// Rendered diff plus its truncation state.
#[derive(Debug, Clone)]
pub struct Rendered {
  pub html:        String,
  /// Set when the output exceeded the budget and was cut.
  pub truncated:   bool,
  /// Byte length of the full render before any truncation.
  pub total_bytes: usize,
}

/// Render `segments` as HTML, truncating at `budget` bytes.
///
/// When truncation happens the output is cut at a char boundary and an
/// explicit notice is appended; the payload is still returned.
pub fn render_html(segments: &[Segment], budget: usize) -> Rendered {
  let mut html = String::from("<div class=\"diff-content\">");
  for segment in segments {
    let text = escape_html(&segment.text);
    match segment.kind {
      SegmentKind::Added => {
        let _ = write!(html, "<span class=\"diff-added\">{text}</span> ");
      }
      SegmentKind::Removed => {
        let _ = write!(html, "<span class=\"diff-removed\">{text}</span> ");
      }
      SegmentKind::Unchanged => {
        let _ = write!(html, "<span>{text}</span> ");
      }
    }
  }
  html.push_str("</div>");

  let total_bytes = html.len();
  if total_bytes <= budget {
    return Rendered { html, truncated: false, total_bytes };
  }

  let mut cut = budget;
  while !html.is_char_boundary(cut) {
    cut -= 1;
  }
  html.truncate(cut);
  let _ = write!(
    html,
    "<div class=\"diff-truncated\">[output truncated; full render was {total_bytes} bytes]</div>"
  );
  Rendered { html, truncated: true, total_bytes }
}

fn escape_html(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      other => out.push(other),
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::diff;

  #[test]
  fn marks_added_and_removed_spans() {
    let rendered = render_html(&diff("a b c", "a x c"), DEFAULT_RENDER_BUDGET);
    assert!(!rendered.truncated);
    assert!(rendered.html.contains("<span class=\"diff-removed\">b</span>"));
    assert!(rendered.html.contains("<span class=\"diff-added\">x</span>"));
  }

  #[test]
  fn escapes_markup_in_tokens() {
    // The tokenizer splits `<script>` into `<`, `script`, `>`, so each
    // bracket is escaped inside its own span.
    let rendered = render_html(&diff("", "<script>"), DEFAULT_RENDER_BUDGET);
    assert!(!rendered.html.contains("<script>"));
    assert!(rendered.html.contains("<span class=\"diff-added\">&lt;</span>"));
    assert!(rendered.html.contains("<span class=\"diff-added\">&gt;</span>"));
  }

  #[test]
  fn escapes_ampersand_in_single_token() {
    let rendered = render_html(&diff("", "A&B"), DEFAULT_RENDER_BUDGET);
    assert!(rendered.html.contains("<span class=\"diff-added\">&amp;</span>"));
  }

  #[test]
  fn truncates_over_budget_with_notice() {
    let new_text = "word ".repeat(2000);
    let rendered = render_html(&diff("", &new_text), 512);
    assert!(rendered.truncated);
    assert!(rendered.html.contains("truncated"));
    assert!(rendered.total_bytes > 512);
    // The payload up to the cut is still present.
    assert!(rendered.html.starts_with("<div class=\"diff-content\">"));
  }

  #[test]
  fn truncation_respects_char_boundaries() {
    let new_text = "한글 ".repeat(500);
    for budget in 100..130 {
      let rendered = render_html(&diff("", &new_text), budget);
      assert!(rendered.truncated);
      // Would panic inside render_html on a bad boundary; also verify the
      // result is valid UTF-8-addressable at every point.
      assert!(rendered.html.is_char_boundary(rendered.html.len()));
    }
  }

  #[test]
  fn empty_diff_renders_empty_container() {
    let rendered = render_html(&[], DEFAULT_RENDER_BUDGET);
    assert_eq!(rendered.html, "<div class=\"diff-content\"></div>");
    assert!(!rendered.truncated);
  }
}
