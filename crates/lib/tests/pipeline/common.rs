//! Shared helpers for pipeline integration tests.

use std::process::Command;

use dynbuild_lib::{Builder, ToolchainConfig};
use tempfile::TempDir;

/// Isolated build environment: a builder writing into its own temp directory.
pub struct TestEnv {
  pub temp: TempDir,
  pub builder: Builder,
}

impl TestEnv {
  /// Returns `None` (and says so on stderr) when no toolchain is available.
  pub fn new() -> Option<Self> {
    let config = ToolchainConfig::from_env().unwrap();
    if !toolchain_available(&config) {
      eprintln!("skipping: {} not available", config.compiler.display());
      return None;
    }

    let temp = TempDir::new().unwrap();
    let config = ToolchainConfig {
      output_dir: Some(temp.path().to_path_buf()),
      ..config
    };
    let builder = Builder::from_config(&config).unwrap();

    Some(Self { temp, builder })
  }
}

fn toolchain_available(config: &ToolchainConfig) -> bool {
  Command::new(&config.compiler)
    .arg("--version")
    .output()
    .map(|o| o.status.success())
    .unwrap_or(false)
}

pub const ADD: &str = r#"extern "C" int add(int a, int b) { return a + b; }"#;

pub const SQUARE_AND_IDENTITY: &str = r#"
extern "C" int square(int number) { return number * number; }
extern "C" int identity(int number) { return number; }
"#;

pub const SYNTAX_ERROR: &str = r#"extern "C" int broken(int a) { return a + ; }"#;
