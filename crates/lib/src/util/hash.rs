//! Hashing utilities for deriving deterministic artifact names.
//!
//! This module provides:
//! - `ContentHash`: A full 64-character SHA-256 of some bytes
//! - `hash_bytes()`: Arbitrary byte hashing

use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;

/// A full 64-character SHA256 hash of some content.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub String);

impl ContentHash {
  /// The truncated prefix used in file names.
  ///
  /// Keeps the first `OBJ_HASH_PREFIX_LEN` characters, which is enough collision
  /// resistance for a single build directory while keeping names readable.
  pub fn short(&self) -> &str {
    &self.0[..OBJ_HASH_PREFIX_LEN.min(self.0.len())]
  }
}

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(hex::encode(hasher.finalize()))
}
