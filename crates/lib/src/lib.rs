//! dynbuild-lib: compile, link, load and call native code at runtime
//!
//! This crate turns snippets of source text into callable native functions:
//! - `Process`: subprocess engine that feeds stdin while draining stdout/stderr
//! - `Compiler` / `Linker`: swappable toolchain steps, with external-toolchain defaults
//! - `Library`: owner of a loaded shared module and its symbols
//! - `Builder`: the fail-fast compile → link → load pipeline

pub mod builder;
pub mod compiler;
pub mod config;
pub mod consts;
pub mod context;
pub mod error;
pub mod library;
pub mod linker;
pub mod object;
pub mod process;
pub mod source;
pub mod util;

pub use builder::{BuildTarget, Builder};
pub use compiler::{Compiler, ExternalCompiler};
pub use config::ToolchainConfig;
pub use context::BuildingContext;
pub use error::{BuildError, ConfigError};
pub use library::{Library, LoadError, Symbol, SymbolError};
pub use linker::{ExternalLinker, Linker};
pub use object::Object;
pub use process::{ExitStatus, Process, ProcessError, ProcessOutput};
pub use source::Source;
