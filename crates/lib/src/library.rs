//! Loaded shared modules and symbol resolution.
//!
//! A [`Library`] is bound to one module path and tries to load it exactly once,
//! when constructed. It then sits in one of three states:
//!
//! - loaded: symbols can be resolved
//! - load failed: [`Library::load_error`] says why
//! - unloaded: [`Library::unload`] (or drop) released the module
//!
//! Failures never panic and are never thrown through the pipeline. Loading
//! problems are kept as state, and resolution returns a `Result` while also
//! recording the loader's message in [`Library::error_string`].
//!
//! # Symbol lifetime
//!
//! [`Library::resolve_function`] returns a [`Symbol`] that borrows the library,
//! so the module cannot be unloaded while it is held. Copying the function
//! pointer out of it, or using the raw address from [`Library::resolve`],
//! escapes that check: such pointers dangle once the library is unloaded or
//! dropped, and calling them afterwards is undefined behavior.

use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info, warn};

pub use libloading::Symbol;

/// The dynamic loader refused to open a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load {}: {message}", path.display())]
pub struct LoadError {
  pub path: PathBuf,
  pub message: String,
}

/// A symbol could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
  #[error("cannot resolve {name}: library is not loaded")]
  NotLoaded { name: String },

  #[error("symbol {name} not found: {message}")]
  NotFound { name: String, message: String },
}

/// Exclusive owner of one loaded shared module.
pub struct Library {
  handle: Option<libloading::Library>,
  path: PathBuf,
  load_error: Option<LoadError>,
  last_error: Mutex<Option<String>>,
}

impl Library {
  /// Bind to `path` and attempt to load it.
  ///
  /// Never fails; check [`Library::is_loaded`].
  pub fn open(path: impl Into<PathBuf>) -> Self {
    let path = path.into();

    // SAFETY: loading runs the module's initializers. The module is code the
    // caller asked us to build and run; executing it is the whole point.
    match unsafe { libloading::Library::new(&path) } {
      Ok(handle) => {
        info!(path = %path.display(), "module loaded");
        Self {
          handle: Some(handle),
          path,
          load_error: None,
          last_error: Mutex::new(None),
        }
      }
      Err(e) => {
        let error = LoadError {
          path: path.clone(),
          message: e.to_string(),
        };
        warn!(path = %path.display(), error = %error.message, "failed to load module");
        Self {
          handle: None,
          path,
          last_error: Mutex::new(Some(error.message.clone())),
          load_error: Some(error),
        }
      }
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn is_loaded(&self) -> bool {
    self.handle.is_some()
  }

  /// Why loading failed, if it did.
  pub fn load_error(&self) -> Option<&LoadError> {
    self.load_error.as_ref()
  }

  /// Message of the most recent load or resolution failure.
  pub fn error_string(&self) -> Option<String> {
    self.last_error.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }

  /// Look up `name` and return its address.
  ///
  /// Names are matched exactly, so entry points must have unmangled
  /// (`extern "C"`) linkage.
  pub fn resolve(&self, name: &str) -> Result<NonNull<c_void>, SymbolError> {
    // SAFETY: `*mut c_void` is only the symbol's address; nothing is read or called.
    let symbol = unsafe { self.lookup::<*mut c_void>(name)? };
    let address = *symbol;

    NonNull::new(address).ok_or_else(|| {
      self.fail(SymbolError::NotFound {
        name: name.to_string(),
        message: "symbol resolved to a null address".to_string(),
      })
    })
  }

  /// Look up `name` and reinterpret it as a value of type `F`.
  ///
  /// # Safety
  ///
  /// `F` must be the symbol's real type. For functions that is an
  /// `unsafe extern "C" fn(..) -> ..` pointer with exactly the signature the
  /// module defines. Nothing verifies this; a mismatch is undefined behavior
  /// as soon as the symbol is used.
  pub unsafe fn resolve_function<F>(&self, name: &str) -> Result<Symbol<'_, F>, SymbolError> {
    // SAFETY: forwarded to the caller.
    unsafe { self.lookup::<F>(name) }
  }

  /// Release the module.
  ///
  /// Returns `false` if nothing was loaded. Afterwards the library behaves as
  /// unloaded; pointers obtained earlier must no longer be used.
  pub fn unload(&mut self) -> bool {
    let Some(handle) = self.handle.take() else {
      return false;
    };

    if let Err(e) = handle.close() {
      warn!(path = %self.path.display(), error = %e, "failed to close module");
      self.set_last_error(e.to_string());
    } else {
      info!(path = %self.path.display(), "module unloaded");
    }
    true
  }

  unsafe fn lookup<F>(&self, name: &str) -> Result<Symbol<'_, F>, SymbolError> {
    let Some(handle) = &self.handle else {
      return Err(self.fail(SymbolError::NotLoaded { name: name.to_string() }));
    };

    // SAFETY: forwarded to the caller.
    match unsafe { handle.get::<F>(name.as_bytes()) } {
      Ok(symbol) => {
        debug!(name = %name, path = %self.path.display(), "symbol resolved");
        Ok(symbol)
      }
      Err(e) => Err(self.fail(SymbolError::NotFound {
        name: name.to_string(),
        message: e.to_string(),
      })),
    }
  }

  fn fail(&self, error: SymbolError) -> SymbolError {
    debug!(error = %error, "symbol resolution failed");
    self.set_last_error(error.to_string());
    error
  }

  fn set_last_error(&self, message: String) {
    *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(message);
  }
}

impl std::fmt::Debug for Library {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Library")
      .field("path", &self.path)
      .field("loaded", &self.is_loaded())
      .field("load_error", &self.load_error)
      .finish()
  }
}
