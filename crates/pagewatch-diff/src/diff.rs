//! LCS table construction and backtrack.

use crate::{Segment, SegmentKind, tokenize};

/// Compute the word-level diff between `old_text` and `new_text`.
///
/// Output is in backtrack (old-text) order, never "all removals then all
/// additions". On a tie between consuming a new token and an old token the
/// new token wins, matching the rendering the review UI expects for
/// equal-length alternatives.
pub fn diff(old_text: &str, new_text: &str) -> Vec<Segment> {
  let old = tokenize(old_text);
  let new = tokenize(new_text);
  let (m, n) = (old.len(), new.len());

  // LCS lengths in a flat (m+1) x (n+1) table.
  let width = n + 1;
  let mut table = vec![0u32; (m + 1) * width];
  for i in 1..=m {
    for j in 1..=n {
      table[i * width + j] = if old[i - 1] == new[j - 1] {
        table[(i - 1) * width + (j - 1)] + 1
      } else {
        table[(i - 1) * width + j].max(table[i * width + (j - 1)])
      };
    }
  }

  // Backtrack from (m, n) to (0, 0).
  let mut segments = Vec::with_capacity(m + n);
  let (mut i, mut j) = (m, n);
  while i > 0 || j > 0 {
    if i > 0 && j > 0 && old[i - 1] == new[j - 1] {
      segments.push(Segment::new(SegmentKind::Unchanged, old[i - 1]));
      i -= 1;
      j -= 1;
    } else if j > 0 && (i == 0 || table[i * width + (j - 1)] >= table[(i - 1) * width + j]) {
      segments.push(Segment::new(SegmentKind::Added, new[j - 1]));
      j -= 1;
    } else {
      segments.push(Segment::new(SegmentKind::Removed, old[i - 1]));
      i -= 1;
    }
  }
  segments.reverse();
  segments
}
