//! Building context: ordered compiler configuration.
//!
//! The context is a plain data bag. Order matters: the rendered argument line
//! keeps insertion order within each group, and groups are always emitted as
//! include dirs, library dirs, libraries, defines, then raw flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingContext {
  pub include_dirs: Vec<PathBuf>,
  pub library_dirs: Vec<PathBuf>,
  pub libraries: Vec<String>,
  pub defines: Vec<String>,
  pub flags: Vec<String>,
}

impl BuildingContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_include_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
    self.include_dirs.push(dir.into());
    self
  }

  pub fn add_library_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
    self.library_dirs.push(dir.into());
    self
  }

  pub fn add_library(&mut self, name: impl Into<String>) -> &mut Self {
    self.libraries.push(name.into());
    self
  }

  /// Add a preprocessor define, either `NAME` or `NAME=VALUE`.
  pub fn add_define(&mut self, define: impl Into<String>) -> &mut Self {
    self.defines.push(define.into());
    self
  }

  /// Add a flag passed to the compiler verbatim.
  pub fn add_flag(&mut self, flag: impl Into<String>) -> &mut Self {
    self.flags.push(flag.into());
    self
  }

  pub fn is_empty(&self) -> bool {
    self.include_dirs.is_empty()
      && self.library_dirs.is_empty()
      && self.libraries.is_empty()
      && self.defines.is_empty()
      && self.flags.is_empty()
  }

  /// Render the context as compiler arguments.
  pub fn to_arguments(&self) -> Vec<String> {
    let mut args = Vec::with_capacity(
      self.include_dirs.len() + self.library_dirs.len() + self.libraries.len() + self.defines.len() + self.flags.len(),
    );

    args.extend(self.include_dirs.iter().map(|dir| path_flag("-I", dir)));
    args.extend(self.library_dirs.iter().map(|dir| path_flag("-L", dir)));
    args.extend(self.libraries.iter().map(|name| format!("-l{}", name)));
    args.extend(self.defines.iter().map(|define| format!("-D{}", define)));
    args.extend(self.flags.iter().cloned());

    args
  }
}

fn path_flag(prefix: &str, path: &Path) -> String {
  format!("{}{}", prefix, path.display())
}
