//! Source text handed to a compiler.
//!
//! A `Source` is immutable and compared by identity, not by content: two
//! sources created from the same text are different targets, while clones of
//! one source refer to the same target.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::util::hash::{ContentHash, hash_bytes};

/// Immutable, shareable translation unit.
#[derive(Clone)]
pub struct Source {
  content: Arc<str>,
}

impl Source {
  /// Create a new source with its own identity.
  pub fn new(content: impl Into<String>) -> Self {
    Self {
      content: Arc::from(content.into()),
    }
  }

  /// Read a translation unit from disk.
  pub fn from_file(path: &Path) -> io::Result<Self> {
    let content = std::fs::read_to_string(path)?;
    Ok(Self::new(content))
  }

  pub fn content(&self) -> &str {
    &self.content
  }

  /// SHA-256 of the content, used for derived object names.
  pub fn content_hash(&self) -> ContentHash {
    hash_bytes(self.content.as_bytes())
  }

  /// Whether `self` and `other` are the same source (not merely equal text).
  pub fn same_as(&self, other: &Source) -> bool {
    Arc::ptr_eq(&self.content, &other.content)
  }
}

impl PartialEq for Source {
  fn eq(&self, other: &Self) -> bool {
    self.same_as(other)
  }
}

impl Eq for Source {}

impl fmt::Debug for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Source")
      .field("hash", &self.content_hash().short())
      .field("len", &self.content.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_share_identity() {
    let source = Source::new("int x;");
    let clone = source.clone();

    assert_eq!(source, clone);
    assert!(source.same_as(&clone));
  }

  #[test]
  fn equal_content_is_not_equal_source() {
    let a = Source::new("int x;");
    let b = Source::new("int x;");

    assert_ne!(a, b);
    assert_eq!(a.content(), b.content());
    assert_eq!(a.content_hash(), b.content_hash());
  }

  #[test]
  fn from_file_reads_content() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("unit.cpp");
    std::fs::write(&path, "extern \"C\" int one() { return 1; }").unwrap();

    let source = Source::from_file(&path).unwrap();

    assert_eq!(source.content(), "extern \"C\" int one() { return 1; }");
  }

  #[test]
  fn from_missing_file_fails() {
    let temp = tempfile::tempdir().unwrap();
    assert!(Source::from_file(&temp.path().join("missing.cpp")).is_err());
  }
}
