//! End-to-end tests: real compiler, real linker, real dynamic loading.
//!
//! Every test skips itself when no C++ toolchain is installed.

mod common;

mod build_tests;
mod library_tests;
