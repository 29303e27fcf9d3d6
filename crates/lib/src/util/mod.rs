//! Shared utilities.
//!
//! Content hashing for derived object names, plus test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;
