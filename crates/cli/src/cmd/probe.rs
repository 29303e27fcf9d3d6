//! Implementation of the `dynbuild probe` command.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use serde::Serialize;

use super::{ToolchainArgs, prepare_builder};
use crate::output::{OutputFormat, print_failure, print_json, print_success};

#[derive(Serialize)]
struct ProbeEntry {
  symbol: String,
  found: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

/// Build `files` and check which of `symbols` resolve.
///
/// Missing symbols are reported, not treated as a failure.
pub fn cmd_probe(files: &[PathBuf], symbols: &[String], toolchain: &ToolchainArgs, format: OutputFormat) -> Result<()> {
  let library = prepare_builder(files, toolchain)?.build()?;
  if let Some(err) = library.load_error() {
    return Err(anyhow!(err.clone()));
  }

  let entries: Vec<ProbeEntry> = symbols
    .iter()
    .map(|symbol| match library.resolve(symbol) {
      Ok(_) => ProbeEntry {
        symbol: symbol.clone(),
        found: true,
        error: None,
      },
      Err(e) => ProbeEntry {
        symbol: symbol.clone(),
        found: false,
        error: Some(e.to_string()),
      },
    })
    .collect();

  if format.is_json() {
    return print_json(&entries);
  }

  for entry in &entries {
    if entry.found {
      print_success(&entry.symbol);
    } else {
      print_failure(&format!("{} (not found)", entry.symbol));
    }
  }

  Ok(())
}
