//! Source-to-object compilation.
//!
//! [`Compiler`] is the seam the [`crate::Builder`] talks to. The default
//! implementation, [`ExternalCompiler`], runs a gcc/clang compatible driver and
//! pipes the source text to it on stdin, so no source file is ever written.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::consts::{DEFAULT_LANGUAGE, DEFAULT_TIMEOUT};
use crate::context::BuildingContext;
use crate::error::BuildError;
use crate::object::Object;
use crate::process::Process;
use crate::source::Source;

/// Turns one source into one object file.
pub trait Compiler: Send + Sync {
  /// Compile `source` into the object named `object_name`.
  ///
  /// A relative `object_name` is resolved against the compiler's own working
  /// directory. Failure to compile is reported as [`BuildError::Compile`]
  /// carrying the compiler's stderr.
  fn compile(
    &self,
    source: &Source,
    object_name: &Path,
    context: Option<&BuildingContext>,
  ) -> Result<Object, BuildError>;
}

/// Compiler backed by an external gcc/clang style executable.
#[derive(Debug, Clone)]
pub struct ExternalCompiler {
  program: PathBuf,
  language: String,
  working_dir: Option<PathBuf>,
  timeout: Option<Duration>,
}

impl ExternalCompiler {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      language: DEFAULT_LANGUAGE.to_string(),
      working_dir: None,
      timeout: Some(DEFAULT_TIMEOUT),
    }
  }

  /// Language passed as `-x<language>` (e.g. `c`, `c++`).
  pub fn with_language(mut self, language: impl Into<String>) -> Self {
    self.language = language.into();
    self
  }

  /// Directory the compiler runs in; relative object names land here.
  pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.working_dir = Some(dir.into());
    self
  }

  /// `None` waits for the compiler indefinitely.
  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  pub fn language(&self) -> &str {
    &self.language
  }

  /// The full argument line for compiling into `object_name`.
  ///
  /// Context flags come first, followed by the fixed tail:
  /// `-fPIC -o <object> -c -x<lang> -`.
  pub fn compile_arguments(&self, object_name: &Path, context: Option<&BuildingContext>) -> Vec<OsString> {
    let mut args: Vec<OsString> = context
      .map(|ctx| ctx.to_arguments().into_iter().map(OsString::from).collect())
      .unwrap_or_default();

    args.push("-fPIC".into());
    args.push("-o".into());
    args.push(object_name.as_os_str().to_os_string());
    args.push("-c".into());
    args.push(format!("-x{}", self.language).into());
    // Read the translation unit from stdin
    args.push("-".into());

    args
  }

  fn object_path(&self, object_name: &Path) -> PathBuf {
    if object_name.is_absolute() {
      return object_name.to_path_buf();
    }
    match &self.working_dir {
      Some(dir) => dir.join(object_name),
      None => std::env::current_dir()
        .map(|cwd| cwd.join(object_name))
        .unwrap_or_else(|_| object_name.to_path_buf()),
    }
  }
}

impl Compiler for ExternalCompiler {
  fn compile(
    &self,
    source: &Source,
    object_name: &Path,
    context: Option<&BuildingContext>,
  ) -> Result<Object, BuildError> {
    let object_path = self.object_path(object_name);
    let args = self.compile_arguments(object_name, context);

    info!(
      compiler = %self.program.display(),
      object = %object_path.display(),
      "compiling"
    );
    debug!(args = ?args, "compiler arguments");

    let mut process = Process::new(&self.program)
      .args(&args)
      .input(source.content().as_bytes())
      .timeout(self.timeout);

    if let Some(dir) = &self.working_dir {
      std::fs::create_dir_all(dir)?;
      process = process.current_dir(dir);
    }

    let output = process.start()?;

    if !output.success() {
      return Err(BuildError::Compile {
        object: object_path,
        status: output.status,
        stderr: output.stderr_lossy(),
      });
    }

    let diagnostics = output.stderr_lossy();
    if !diagnostics.trim().is_empty() {
      warn!(
        object = %object_path.display(),
        diagnostics = %diagnostics.trim(),
        "compiler reported diagnostics"
      );
    }

    Ok(Object::new(object_path).with_diagnostics(diagnostics))
  }
}
