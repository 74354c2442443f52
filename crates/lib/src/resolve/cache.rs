//! On-disk resolution cache.
//!
//! The cache remembers the metadata of packages resolved by exact pin, so
//! a later run with the same settings can skip the metadata query.
//!
//! # Cache File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": {
//!     "3f2a9c0d1b7e6a5f4c3d/spdlog/1.13.0": {
//!       "version": "1.13.0",
//!       "requires": ["fmt/10.2.1"],
//!       "settings": null,
//!       "cpp_info": { "include_dirs": ["include"], "lib_dirs": ["lib"], "libs": ["spdlog"], "defines": [] }
//!     }
//!   }
//! }
//! ```
//!
//! The cache is read once before resolution and never mutated during it.
//! New entries are appended afterwards and the file is replaced atomically.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::CACHE_FILENAME;
use crate::metadata::Candidate;
use crate::requirements::Version;
use crate::util::fs::write_atomic;
use crate::util::hash::Fingerprint;

/// Current cache file format version.
pub const CACHE_VERSION: u32 = 1;

/// Errors from reading or writing the cache file.
#[derive(Debug, Error)]
pub enum CacheError {
  #[error("failed to read resolution cache {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write resolution cache {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse resolution cache: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize resolution cache: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("unsupported resolution cache version {0}, expected {CACHE_VERSION}")]
  UnsupportedVersion(u32),
}

/// Cached candidate metadata keyed by settings fingerprint, name and version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionCache {
  pub version: u32,
  pub entries: BTreeMap<String, Candidate>,
}

impl Default for ResolutionCache {
  fn default() -> Self {
    Self::new()
  }
}

impl ResolutionCache {
  pub fn new() -> Self {
    Self {
      version: CACHE_VERSION,
      entries: BTreeMap::new(),
    }
  }

  /// Path of the cache file inside `cache_dir`.
  pub fn path_in(cache_dir: &Path) -> PathBuf {
    cache_dir.join(CACHE_FILENAME)
  }

  /// Entry key. Versions are keyed by their zero-filled form so `10.2` and
  /// `10.2.0` share an entry.
  pub fn key(settings: &Fingerprint, name: &str, version: &Version) -> String {
    format!("{}/{}/{}", settings, name, version.semver())
  }

  /// Load the cache file.
  ///
  /// Returns `Ok(None)` if the file doesn't exist.
  pub fn load(path: &Path) -> Result<Option<Self>, CacheError> {
    let content = match std::fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(source) => {
        return Err(CacheError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let cache: ResolutionCache = serde_json::from_str(&content).map_err(CacheError::Parse)?;
    if cache.version != CACHE_VERSION {
      return Err(CacheError::UnsupportedVersion(cache.version));
    }
    Ok(Some(cache))
  }

  /// Load the cache file, starting empty when it is missing or unusable.
  pub fn load_or_default(path: &Path) -> Self {
    match Self::load(path) {
      Ok(Some(cache)) => {
        debug!(path = %path.display(), entries = cache.entries.len(), "loaded resolution cache");
        cache
      }
      Ok(None) => Self::new(),
      Err(e) => {
        warn!(path = %path.display(), error = %e, "ignoring unusable resolution cache");
        Self::new()
      }
    }
  }

  /// Write the cache, replacing any existing file atomically.
  pub fn save(&self, path: &Path) -> Result<(), CacheError> {
    let content = serde_json::to_string_pretty(self).map_err(CacheError::Serialize)?;
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|source| CacheError::Write {
        path: path.to_path_buf(),
        source,
      })?;
    }
    write_atomic(path, content.as_bytes()).map_err(|source| CacheError::Write {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn get(&self, settings: &Fingerprint, name: &str, version: &Version) -> Option<&Candidate> {
    self.entries.get(&Self::key(settings, name, version))
  }

  /// Record a candidate. Existing entries are kept; returns whether the
  /// entry was new.
  pub fn insert(&mut self, settings: &Fingerprint, name: &str, candidate: Candidate) -> bool {
    let key = Self::key(settings, name, &candidate.version);
    if self.entries.contains_key(&key) {
      return false;
    }
    self.entries.insert(key, candidate);
    true
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
