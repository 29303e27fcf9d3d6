//! Object-to-module linking.
//!
//! [`Linker`] turns the objects of one build into a single shared module and
//! hands back the loaded [`Library`]. [`ExternalLinker`] runs a gcc/clang style
//! driver with `-shared`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, info};

use crate::consts::{DEFAULT_TIMEOUT, MODULE_PREFIX, shared_module_extension};
use crate::error::BuildError;
use crate::library::Library;
use crate::object::Object;
use crate::process::Process;

/// Shared by every linker in the process; the pid separates processes.
static MODULE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Turns objects into one loaded module.
pub trait Linker: Send + Sync {
  /// Link `objects`, in order, into a fresh module and load it.
  ///
  /// The returned `Library` may still have failed to load; check
  /// [`Library::is_loaded`].
  fn link(&self, objects: &[Object]) -> Result<Library, BuildError>;
}

/// Generate the next unique module file name, e.g. `exec_4242_3.so`.
pub fn next_module_name() -> String {
  let n = MODULE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
  format!(
    "{}{}_{}.{}",
    MODULE_PREFIX,
    std::process::id(),
    n,
    shared_module_extension()
  )
}

/// Linker backed by an external gcc/clang style executable.
#[derive(Debug, Clone)]
pub struct ExternalLinker {
  program: PathBuf,
  output_dir: Option<PathBuf>,
  timeout: Option<Duration>,
}

impl ExternalLinker {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      output_dir: None,
      timeout: Some(DEFAULT_TIMEOUT),
    }
  }

  /// Directory generated modules are written to (default: current directory).
  pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.output_dir = Some(dir.into());
    self
  }

  /// `None` waits for the linker indefinitely.
  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  /// The full argument line for linking `objects` into `module_name`.
  pub fn link_arguments(module_name: &str, objects: &[Object]) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-shared", "-fPIC", "-lc", "-o", module_name]
      .into_iter()
      .map(OsString::from)
      .collect();

    args.extend(objects.iter().map(|object| object.path().as_os_str().to_os_string()));
    args
  }

  fn output_dir(&self) -> Result<PathBuf, BuildError> {
    match &self.output_dir {
      Some(dir) if dir.is_absolute() => Ok(dir.clone()),
      Some(dir) => Ok(std::env::current_dir()?.join(dir)),
      None => Ok(std::env::current_dir()?),
    }
  }
}

impl Linker for ExternalLinker {
  fn link(&self, objects: &[Object]) -> Result<Library, BuildError> {
    let output_dir = self.output_dir()?;
    std::fs::create_dir_all(&output_dir)?;

    let module_name = next_module_name();
    let module_path = output_dir.join(&module_name);
    let args = Self::link_arguments(&module_name, objects);

    info!(
      linker = %self.program.display(),
      module = %module_path.display(),
      objects = objects.len(),
      "linking"
    );
    debug!(args = ?args, "linker arguments");

    let output = Process::new(&self.program)
      .args(&args)
      .current_dir(&output_dir)
      .timeout(self.timeout)
      .start()?;

    if !output.success() {
      return Err(BuildError::Link {
        module: module_path,
        status: output.status,
        stderr: output.stderr_lossy(),
      });
    }

    Ok(Library::open(module_path))
  }
}
