//! Content canonicalisation and fingerprinting.
//!
//! The fingerprint is a SHA-256 over the canonical text, hex-encoded
//! lowercase. Canonicalisation makes byte-trivial recaptures (CRLF vs LF,
//! trailing blanks) hash identically so the write-path dedup catches them.

use sha2::{Digest, Sha256};

/// The output of [`normalize`]: the canonical text plus its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedContent {
  pub content_hash: String,
  pub content_text: String,
}

/// Canonicalise `raw` and compute its content fingerprint.
///
/// Pure: identical input always yields identical output. Empty input is a
/// legitimate observation (the page went blank), not an error.
pub fn normalize(raw: &str) -> NormalizedContent {
  let content_text = canonicalize(raw);
  let content_hash = hash_text(&content_text);
  NormalizedContent { content_hash, content_text }
}

/// SHA-256 of `text`, hex-encoded lowercase.
pub fn hash_text(text: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(text.as_bytes());
  hex::encode(hasher.finalize())
}

/// `true` iff `s` is a well-formed fingerprint (64 hex characters).
pub fn is_valid_hash(s: &str) -> bool {
  s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Normalise line endings to `\n`, strip trailing whitespace from each line,
/// and trim trailing blank lines.
fn canonicalize(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for line in raw.replace("\r\n", "\n").replace('\r', "\n").split('\n') {
    out.push_str(line.trim_end());
    out.push('\n');
  }
  // split always yields at least one element, so one '\n' was pushed even
  // for empty input; trim back to the content.
  while out.ends_with('\n') {
    out.pop();
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_input_identical_hash() {
    let a = normalize("hello world");
    let b = normalize("hello world");
    assert_eq!(a, b);
    assert!(is_valid_hash(&a.content_hash));
  }

  #[test]
  fn line_endings_do_not_matter() {
    let unix = normalize("line one\nline two");
    let dos = normalize("line one\r\nline two");
    assert_eq!(unix.content_hash, dos.content_hash);
    assert_eq!(unix.content_text, dos.content_text);
  }

  #[test]
  fn trailing_whitespace_stripped() {
    let a = normalize("open  \nclosed\n\n");
    assert_eq!(a.content_text, "open\nclosed");
  }

  #[test]
  fn empty_input_is_a_real_observation() {
    let a = normalize("");
    assert_eq!(a.content_text, "");
    assert!(is_valid_hash(&a.content_hash));
  }

  #[test]
  fn canonicalisation_is_idempotent() {
    let once = normalize("a \r\nb\r\n");
    let twice = normalize(&once.content_text);
    assert_eq!(once, twice);
  }

  #[test]
  fn different_content_different_hash() {
    assert_ne!(normalize("open").content_hash, normalize("closed").content_hash);
  }

  #[test]
  fn hash_validation() {
    assert!(is_valid_hash(&hash_text("x")));
    assert!(!is_valid_hash("abc123"));
    assert!(!is_valid_hash(&"g".repeat(64)));
  }
}
