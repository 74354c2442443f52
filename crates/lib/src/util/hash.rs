//! Fingerprinting utilities for package identities and cache keys.
//!
//! This module provides:
//! - `Fingerprint`: a truncated 20-character SHA-256 identifier
//! - `fingerprint_bytes()`: fingerprint arbitrary bytes

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::FINGERPRINT_LEN;

/// A stable identifier derived from hashed content.
///
/// The fingerprint is a 20-character truncated SHA-256, lowercase hex,
/// e.g. `"a1b2c3d4e5f6789012ab"`. It is embedded in resolved nodes and
/// generated descriptors, so it must only ever depend on its inputs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Fingerprint arbitrary bytes.
pub fn fingerprint_bytes(data: &[u8]) -> Fingerprint {
  let mut hasher = Sha256::new();
  hasher.update(data);
  let full = hex::encode(hasher.finalize());
  Fingerprint(full[..FINGERPRINT_LEN].to_string())
}
