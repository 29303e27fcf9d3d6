//! Toolchain configuration.
//!
//! Defaults describe a `c++` driver on `PATH`, writing into the current
//! directory with a two minute limit per invocation. A JSON file and
//! `DYNBUILD_*` environment variables can override any of it:
//!
//! ```json
//! {
//!   "compiler": "/usr/bin/clang++",
//!   "linker": "/usr/bin/clang++",
//!   "output_dir": "build",
//!   "timeout_secs": 30,
//!   "context": { "include_dirs": ["include"], "defines": ["NDEBUG"] }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
  DEFAULT_LANGUAGE, DEFAULT_TIMEOUT, DEFAULT_TOOLCHAIN, ENV_COMPILER, ENV_LANGUAGE, ENV_LINKER, ENV_OUT_DIR,
  ENV_TIMEOUT_SECS,
};
use crate::context::BuildingContext;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
  pub compiler: PathBuf,
  pub linker: PathBuf,
  /// Source language passed to the compiler as `-x<language>`.
  pub language: String,
  /// Where objects and modules are written. `None` means the current directory.
  pub output_dir: Option<PathBuf>,
  /// Per-invocation limit in seconds; 0 waits forever.
  pub timeout_secs: u64,
  pub context: BuildingContext,
}

impl Default for ToolchainConfig {
  fn default() -> Self {
    Self {
      compiler: PathBuf::from(DEFAULT_TOOLCHAIN),
      linker: PathBuf::from(DEFAULT_TOOLCHAIN),
      language: DEFAULT_LANGUAGE.to_string(),
      output_dir: None,
      timeout_secs: DEFAULT_TIMEOUT.as_secs(),
      context: BuildingContext::default(),
    }
  }
}

impl ToolchainConfig {
  /// Defaults with environment overrides applied.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::default().with_env_overrides()
  }

  /// Read a JSON config file. Missing fields keep their defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;

    let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    debug!(path = %path.display(), "loaded toolchain config");
    Ok(config)
  }

  /// Apply `DYNBUILD_*` environment variables on top of `self`.
  pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
    if let Some(compiler) = env_var(ENV_COMPILER) {
      self.compiler = PathBuf::from(compiler);
    }
    if let Some(linker) = env_var(ENV_LINKER) {
      self.linker = PathBuf::from(linker);
    }
    if let Some(language) = env_var(ENV_LANGUAGE) {
      self.language = language;
    }
    if let Some(dir) = env_var(ENV_OUT_DIR) {
      self.output_dir = Some(PathBuf::from(dir));
    }
    if let Some(secs) = env_var(ENV_TIMEOUT_SECS) {
      self.timeout_secs = secs.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: ENV_TIMEOUT_SECS.to_string(),
        value: secs.clone(),
      })?;
    }
    Ok(self)
  }

  pub fn timeout(&self) -> Option<Duration> {
    (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
  }

  /// The absolute output directory, created if it does not exist yet.
  pub fn resolved_output_dir(&self) -> Result<PathBuf, ConfigError> {
    let dir = match &self.output_dir {
      Some(dir) => dir.clone(),
      None => PathBuf::from("."),
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::OutputDir {
      path: dir.clone(),
      source,
    })?;

    dunce::canonicalize(&dir).map_err(|source| ConfigError::OutputDir { path: dir, source })
  }
}

/// Read an environment variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|value| !value.is_empty())
}
