mod build;
mod call;
mod probe;

pub use build::cmd_build;
pub use call::cmd_call;
pub use probe::cmd_probe;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use dynbuild_lib::{Builder, Source, ToolchainConfig};

/// Toolchain and building-context options shared by every command.
#[derive(Debug, Default, Args)]
pub struct ToolchainArgs {
  /// JSON toolchain config file
  #[arg(long)]
  pub config: Option<PathBuf>,

  /// Directory for objects and modules
  #[arg(long)]
  pub out_dir: Option<PathBuf>,

  /// Limit per compiler/linker run (e.g. "30s", "2m"; "0s" disables)
  #[arg(long, value_parser = humantime::parse_duration)]
  pub timeout: Option<Duration>,

  /// Include directory
  #[arg(short = 'I', long = "include")]
  pub include_dirs: Vec<PathBuf>,

  /// Library directory
  #[arg(short = 'L', long = "lib-dir")]
  pub library_dirs: Vec<PathBuf>,

  /// Library to link
  #[arg(short = 'l', long = "lib")]
  pub libraries: Vec<String>,

  /// Preprocessor define (NAME or NAME=VALUE)
  #[arg(short = 'D', long = "define")]
  pub defines: Vec<String>,

  /// Raw compiler flag, passed verbatim
  #[arg(long = "flag", allow_hyphen_values = true)]
  pub flags: Vec<String>,
}

impl ToolchainArgs {
  /// Config file (or defaults), then environment, then command-line flags.
  pub fn resolve_config(&self) -> Result<ToolchainConfig> {
    let base = match &self.config {
      Some(path) => ToolchainConfig::load(path)?,
      None => ToolchainConfig::default(),
    };
    let mut config = base.with_env_overrides()?;

    if let Some(dir) = &self.out_dir {
      config.output_dir = Some(dir.clone());
    }
    if let Some(timeout) = self.timeout {
      // Partial seconds round up; only an explicit zero disables the limit
      config.timeout_secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    }

    let context = &mut config.context;
    context.include_dirs.extend(self.include_dirs.iter().cloned());
    context.library_dirs.extend(self.library_dirs.iter().cloned());
    context.libraries.extend(self.libraries.iter().cloned());
    context.defines.extend(self.defines.iter().cloned());
    context.flags.extend(self.flags.iter().cloned());

    Ok(config)
  }
}

/// Read every file into a target on a builder configured from `args`.
pub fn prepare_builder(files: &[PathBuf], args: &ToolchainArgs) -> Result<Builder> {
  let config = args.resolve_config()?;
  debug!(config = ?config, "resolved toolchain config");

  let mut builder = Builder::from_config(&config)?;
  for file in files {
    builder.add_target(read_source(file)?);
  }
  Ok(builder)
}

fn read_source(path: &Path) -> Result<Source> {
  Source::from_file(path).with_context(|| format!("Failed to read source {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_extend_context_in_order() {
    let args = ToolchainArgs {
      include_dirs: vec![PathBuf::from("inc")],
      defines: vec!["A".to_string(), "B=2".to_string()],
      flags: vec!["-O2".to_string()],
      ..Default::default()
    };

    let config = args.resolve_config().unwrap();

    assert_eq!(config.context.to_arguments(), vec!["-Iinc", "-DA", "-DB=2", "-O2"]);
  }

  #[test]
  fn zero_timeout_disables_limit() {
    let args = ToolchainArgs {
      timeout: Some(Duration::ZERO),
      ..Default::default()
    };

    assert_eq!(args.resolve_config().unwrap().timeout(), None);
  }
}
