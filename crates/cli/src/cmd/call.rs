//! Implementation of the `dynbuild call` command.

use std::ffi::c_int;
use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use serde::Serialize;

use dynbuild_lib::{Library, Symbol};

use super::{ToolchainArgs, prepare_builder};
use crate::output::{OutputFormat, print_json, print_success};

/// Most integer arguments `call` knows how to pass.
pub const MAX_ARGS: usize = 4;

#[derive(Serialize)]
struct CallReport<'a> {
  symbol: &'a str,
  args: &'a [i32],
  result: i32,
}

/// Build `files`, then call `symbol` with `args` and print what it returned.
///
/// The function is assumed to be `extern "C" int symbol(int, ...)` with exactly
/// `args.len()` parameters.
pub fn cmd_call(
  files: &[PathBuf],
  symbol: &str,
  args: &[i32],
  toolchain: &ToolchainArgs,
  format: OutputFormat,
) -> Result<()> {
  if args.len() > MAX_ARGS {
    bail!("at most {} integer arguments are supported, got {}", MAX_ARGS, args.len());
  }

  let library = prepare_builder(files, toolchain)?.build()?;
  if let Some(err) = library.load_error() {
    return Err(anyhow!(err.clone()));
  }

  // SAFETY: the user asserts the signature by choosing the argument count.
  let result = unsafe { call_int_function(&library, symbol, args)? };

  if format.is_json() {
    print_json(&CallReport { symbol, args, result })?;
  } else {
    let rendered: Vec<String> = args.iter().map(i32::to_string).collect();
    print_success(&format!("{}({}) = {}", symbol, rendered.join(", "), result));
  }

  Ok(())
}

/// Resolve `name` as an int function of `args.len()` ints and call it.
///
/// # Safety
///
/// The symbol must really be an `extern "C"` function with that signature.
unsafe fn call_int_function(library: &Library, name: &str, args: &[i32]) -> Result<i32> {
  let result = unsafe {
    match *args {
      [] => {
        let f: Symbol<unsafe extern "C" fn() -> c_int> = library.resolve_function(name)?;
        f()
      }
      [a] => {
        let f: Symbol<unsafe extern "C" fn(c_int) -> c_int> = library.resolve_function(name)?;
        f(a)
      }
      [a, b] => {
        let f: Symbol<unsafe extern "C" fn(c_int, c_int) -> c_int> = library.resolve_function(name)?;
        f(a, b)
      }
      [a, b, c] => {
        let f: Symbol<unsafe extern "C" fn(c_int, c_int, c_int) -> c_int> = library.resolve_function(name)?;
        f(a, b, c)
      }
      [a, b, c, d] => {
        let f: Symbol<unsafe extern "C" fn(c_int, c_int, c_int, c_int) -> c_int> = library.resolve_function(name)?;
        f(a, b, c, d)
      }
      _ => bail!("at most {} integer arguments are supported", MAX_ARGS),
    }
  };

  Ok(result)
}
