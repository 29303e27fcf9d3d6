//! Build orchestration: compile every target, link once, load the result.
//!
//! The pipeline is fail-fast. Targets compile strictly in registration order,
//! the first failure aborts the whole build, and the linker only runs once
//! every target has produced an object. Building never changes the registered
//! targets, so a builder can be rebuilt or extended afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::compiler::{Compiler, ExternalCompiler};
use crate::config::ToolchainConfig;
use crate::consts::OBJECT_EXTENSION;
use crate::context::BuildingContext;
use crate::error::{BuildError, ConfigError};
use crate::library::Library;
use crate::linker::{ExternalLinker, Linker};
use crate::source::Source;

/// A registered source and the object name it compiles to.
#[derive(Debug, Clone)]
pub struct BuildTarget {
  source: Source,
  object_name: PathBuf,
}

impl BuildTarget {
  pub fn source(&self) -> &Source {
    &self.source
  }

  pub fn object_name(&self) -> &Path {
    &self.object_name
  }
}

/// Derive the default object name for `source` from its content hash.
pub fn derived_object_name(source: &Source) -> PathBuf {
  PathBuf::from(format!("{}.{}", source.content_hash().short(), OBJECT_EXTENSION))
}

#[derive(Default)]
pub struct Builder {
  compiler: Option<Arc<dyn Compiler>>,
  linker: Option<Arc<dyn Linker>>,
  context: Option<Arc<BuildingContext>>,
  targets: Vec<BuildTarget>,
}

impl Builder {
  pub fn new() -> Self {
    Self::default()
  }

  /// A builder wired to the external toolchain described by `config`.
  ///
  /// Objects and modules are written to the config's output directory, which
  /// is created if needed. A non-empty config context becomes the building
  /// context.
  pub fn from_config(config: &ToolchainConfig) -> Result<Self, ConfigError> {
    let output_dir = config.resolved_output_dir()?;

    let compiler = ExternalCompiler::new(&config.compiler)
      .with_language(&config.language)
      .with_working_dir(&output_dir)
      .with_timeout(config.timeout());
    let linker = ExternalLinker::new(&config.linker)
      .with_output_dir(&output_dir)
      .with_timeout(config.timeout());

    let mut builder = Self::new();
    builder.set_compiler(Arc::new(compiler));
    builder.set_linker(Arc::new(linker));
    if !config.context.is_empty() {
      builder.set_context(config.context.clone());
    }

    Ok(builder)
  }

  pub fn set_compiler(&mut self, compiler: Arc<dyn Compiler>) {
    self.compiler = Some(compiler);
  }

  pub fn compiler(&self) -> Option<&Arc<dyn Compiler>> {
    self.compiler.as_ref()
  }

  pub fn set_linker(&mut self, linker: Arc<dyn Linker>) {
    self.linker = Some(linker);
  }

  pub fn linker(&self) -> Option<&Arc<dyn Linker>> {
    self.linker.as_ref()
  }

  pub fn set_context(&mut self, context: impl Into<Arc<BuildingContext>>) {
    self.context = Some(context.into());
  }

  pub fn context(&self) -> Option<&BuildingContext> {
    self.context.as_deref()
  }

  /// Register `source` under a name derived from its content.
  ///
  /// Returns the derived object name. Identical content always derives the
  /// same name.
  pub fn add_target(&mut self, source: Source) -> PathBuf {
    let object_name = derived_object_name(&source);
    debug!(object = %object_name.display(), "target added");
    self.targets.push(BuildTarget {
      source,
      object_name: object_name.clone(),
    });
    object_name
  }

  /// Register `source` under an explicit object name.
  ///
  /// Fails with [`ConfigError::DuplicateTarget`] if any registered target
  /// already uses that name.
  pub fn add_named_target(&mut self, source: Source, object_name: impl Into<PathBuf>) -> Result<(), ConfigError> {
    let object_name = object_name.into();

    if self.targets.iter().any(|target| target.object_name == object_name) {
      return Err(ConfigError::DuplicateTarget { name: object_name });
    }

    debug!(object = %object_name.display(), "target added");
    self.targets.push(BuildTarget { source, object_name });
    Ok(())
  }

  /// Remove the first target registered with this exact source.
  pub fn remove_target(&mut self, source: &Source) -> Option<BuildTarget> {
    let index = self.targets.iter().position(|target| target.source.same_as(source))?;
    Some(self.targets.remove(index))
  }

  /// Remove the target with this object name.
  pub fn remove_named_target(&mut self, object_name: &Path) -> Option<BuildTarget> {
    let index = self.targets.iter().position(|target| target.object_name == object_name)?;
    Some(self.targets.remove(index))
  }

  pub fn clear_targets(&mut self) {
    self.targets.clear();
  }

  pub fn target_count(&self) -> usize {
    self.targets.len()
  }

  pub fn target_at(&self, index: usize) -> Option<&BuildTarget> {
    self.targets.get(index)
  }

  pub fn targets(&self) -> &[BuildTarget] {
    &self.targets
  }

  /// Compile all targets, link them into one module and load it.
  pub fn build(&self) -> Result<Library, BuildError> {
    let compiler = self.compiler.as_ref().ok_or(ConfigError::MissingCompiler)?;
    let linker = self.linker.as_ref().ok_or(ConfigError::MissingLinker)?;

    info!(targets = self.targets.len(), "building");

    let context = self.context.as_deref();
    let mut objects = Vec::with_capacity(self.targets.len());

    for (index, target) in self.targets.iter().enumerate() {
      debug!(index, object = %target.object_name.display(), "compiling target");
      objects.push(compiler.compile(&target.source, &target.object_name, context)?);
    }

    let library = linker.link(&objects)?;

    info!(
      module = %library.path().display(),
      loaded = library.is_loaded(),
      "build finished"
    );

    Ok(library)
  }
}

impl fmt::Debug for Builder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Builder")
      .field("has_compiler", &self.compiler.is_some())
      .field("has_linker", &self.linker.is_some())
      .field("context", &self.context)
      .field("targets", &self.targets)
      .finish()
  }
}
