//! Line records and seen-sets
//!
//! A line record is the trimmed, non-empty text of one line of the watched
//! file. Two records with the same text are duplicates no matter where in the
//! file they came from, so every delivery path keeps a [`LineSet`] of what it
//! has already handled and asks [`LineSet::diff_new`] for the rest.

use std::collections::HashSet;

/// Maximum characters per outbound message body.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Insertion-ordered set of line contents.
#[derive(Debug, Clone, Default)]
pub struct LineSet {
  order: Vec<String>,
  index: HashSet<String>,
}

impl LineSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contains(&self, line: &str) -> bool {
    self.index.contains(line)
  }

  /// Insert a line, returning false if it was already present.
  pub fn insert(&mut self, line: impl Into<String>) -> bool {
    let line = line.into();
    if self.index.contains(&line) {
      return false;
    }
    self.index.insert(line.clone());
    self.order.push(line);
    true
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn clear(&mut self) {
    self.order.clear();
    self.index.clear();
  }

  /// Lines in the order they were first inserted.
  #[cfg(test)]
  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.order.iter().map(String::as_str)
  }

  /// Classify `lines` against this set.
  ///
  /// Each line is trimmed and empty lines are dropped. A line is new if its
  /// trimmed text has not been seen; the set is updated as each line is
  /// classified, so a repeat later in the same input is not new. New lines
  /// come back in input order.
  pub fn diff_new<'a, I>(&mut self, lines: I) -> Vec<String>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let mut fresh = Vec::new();
    for line in lines {
      let trimmed = line.trim();
      if trimmed.is_empty() {
        continue;
      }
      if self.insert(trimmed) {
        fresh.push(trimmed.to_string());
      }
    }
    fresh
  }
}

/// Unique trimmed non-empty lines of `content`, in first-seen order.
pub fn unique_lines(content: &str) -> Vec<String> {
  LineSet::new().diff_new(content.lines())
}

/// Split `text` into consecutive pieces of at most `max_chars` characters.
///
/// Splits on char boundaries, never inside a UTF-8 sequence. Empty input
/// yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
  let max_chars = max_chars.max(1);
  let mut chunks = Vec::new();
  let mut rest = text;

  while !rest.is_empty() {
    let split = rest.char_indices().nth(max_chars).map(|(idx, _)| idx).unwrap_or(rest.len());
    let (head, tail) = rest.split_at(split);
    chunks.push(head);
    rest = tail;
  }

  chunks
}
