//! Implementation of the `dynbuild build` command.

use std::path::PathBuf;

use anyhow::{Result, bail};
use serde::Serialize;

use super::{ToolchainArgs, prepare_builder};
use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning};

#[derive(Serialize)]
struct BuildReport {
  module: PathBuf,
  loaded: bool,
  objects: Vec<PathBuf>,
}

/// Compile and link `files`, then report where the module landed.
///
/// Exits with an error if the module was produced but could not be loaded.
pub fn cmd_build(files: &[PathBuf], toolchain: &ToolchainArgs, format: OutputFormat) -> Result<()> {
  let builder = prepare_builder(files, toolchain)?;
  let library = builder.build()?;

  if format.is_json() {
    print_json(&BuildReport {
      module: library.path().to_path_buf(),
      loaded: library.is_loaded(),
      objects: builder.targets().iter().map(|t| t.object_name().to_path_buf()).collect(),
    })?;
  } else {
    print_success("Build complete");
    print_stat("Module", &library.path().display().to_string());
    print_stat("Targets", &builder.target_count().to_string());
  }

  if let Some(err) = library.load_error() {
    print_warning(&err.to_string());
    bail!("module was built but could not be loaded");
  }

  Ok(())
}
