//! Error types for configuring and running the build pipeline.
//!
//! Loading a module and resolving symbols report failures on the `Library`
//! itself (see [`crate::library`]); everything here aborts `Builder::build`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::process::{ExitStatus, ProcessError};

/// The pipeline or toolchain configuration is incomplete or invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("no compiler configured")]
  MissingCompiler,

  #[error("no linker configured")]
  MissingLinker,

  /// Two targets were registered with the same explicit object name.
  #[error("a target with object name {} is already registered", name.display())]
  DuplicateTarget { name: PathBuf },

  #[error("invalid value {value:?} for {var}")]
  InvalidEnv { var: String, value: String },

  #[error("failed to read config {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to prepare output directory {}: {source}", path.display())]
  OutputDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// The compiler or linker could not be run at all, or timed out.
  #[error(transparent)]
  Process(#[from] ProcessError),

  /// The compiler exited unsuccessfully.
  #[error("compilation of {} failed ({status}):\n{stderr}", object.display())]
  Compile {
    object: PathBuf,
    status: ExitStatus,
    stderr: String,
  },

  /// The linker exited unsuccessfully.
  #[error("linking {} failed ({status}):\n{stderr}", module.display())]
  Link {
    module: PathBuf,
    status: ExitStatus,
    stderr: String,
  },

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

impl BuildError {
  /// Captured toolchain stderr, for compile and link failures.
  pub fn stderr(&self) -> Option<&str> {
    match self {
      BuildError::Compile { stderr, .. } | BuildError::Link { stderr, .. } => Some(stderr),
      _ => None,
    }
  }
}
