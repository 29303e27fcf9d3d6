//! Crate-wide constants.

use std::time::Duration;

/// Number of hex characters kept from a content hash when deriving object names.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Extension appended to derived object names.
pub const OBJECT_EXTENSION: &str = "o";

/// Prefix of every generated module file name.
pub const MODULE_PREFIX: &str = "exec_";

/// Default program used for both compiling and linking.
pub const DEFAULT_TOOLCHAIN: &str = "c++";

/// Default source language passed as `-x<lang>`.
pub const DEFAULT_LANGUAGE: &str = "c++";

/// Default bound on a single compiler or linker invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

pub const ENV_COMPILER: &str = "DYNBUILD_CC";
pub const ENV_LINKER: &str = "DYNBUILD_LD";
pub const ENV_LANGUAGE: &str = "DYNBUILD_LANG";
pub const ENV_OUT_DIR: &str = "DYNBUILD_OUT_DIR";
pub const ENV_TIMEOUT_SECS: &str = "DYNBUILD_TIMEOUT_SECS";

/// Platform shared-module extension, without the leading dot.
pub fn shared_module_extension() -> &'static str {
  #[cfg(target_os = "macos")]
  {
    "dylib"
  }
  #[cfg(target_os = "windows")]
  {
    "dll"
  }
  #[cfg(not(any(target_os = "macos", target_os = "windows")))]
  {
    "so"
  }
}
