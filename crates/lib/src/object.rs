//! Compiled object artifacts.
//!
//! Objects are references to files on disk. Nothing in the pipeline deletes
//! them after linking; callers that want the directory kept clean remove the
//! files themselves.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
  path: PathBuf,
  /// Compiler stderr from a successful compile (usually warnings).
  diagnostics: String,
}

impl Object {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      diagnostics: String::new(),
    }
  }

  pub fn with_diagnostics(mut self, diagnostics: impl Into<String>) -> Self {
    self.diagnostics = diagnostics.into();
    self
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn diagnostics(&self) -> &str {
    &self.diagnostics
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keeps_path_and_diagnostics() {
    let object = Object::new("/tmp/unit.o").with_diagnostics("warning: unused variable");

    assert_eq!(object.path(), Path::new("/tmp/unit.o"));
    assert_eq!(object.diagnostics(), "warning: unused variable");
  }
}
