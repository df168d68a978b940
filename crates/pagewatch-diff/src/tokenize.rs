//! Unicode-aware tokenizer.
//!
//! A maximal run of letters/digits is one token; a maximal run of other
//! non-space characters is one token; whitespace separates tokens but is
//! never emitted.

/// Character classes that form token runs.
#[derive(PartialEq, Eq, Clone, Copy)]
enum Class {
  Word,
  Symbol,
}

fn classify(c: char) -> Option<Class> {
  if c.is_whitespace() {
    None
  } else if c.is_alphanumeric() {
    Some(Class::Word)
  } else {
    Some(Class::Symbol)
  }
}

/// Split `text` into tokens. Borrowed slices — no allocation per token.
pub fn tokenize(text: &str) -> Vec<&str> {
  let mut tokens = Vec::new();
  let mut run: Option<(usize, Class)> = None;

  for (idx, c) in text.char_indices() {
    let class = classify(c);
    match run {
      Some((start, rc)) if class != Some(rc) => {
        tokens.push(&text[start..idx]);
        run = class.map(|cc| (idx, cc));
      }
      Some(_) => {}
      None => run = class.map(|cc| (idx, cc)),
    }
  }
  if let Some((start, _)) = run {
    tokens.push(&text[start..]);
  }
  tokens
}
