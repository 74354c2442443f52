//! Package metadata sources.
//!
//! The resolver never reads package metadata itself. It asks a
//! [`MetadataSource`] which versions of a package exist, what they
//! require, which settings axes they consume and which artifacts they
//! expose. Three sources are provided:
//! - [`MemorySource`]: an in-memory table, mostly for tests and embedding
//! - [`IndexDirectory`]: one `<name>.json` document per package on disk
//! - [`HttpIndex`]: the same documents served over HTTP

mod http;
mod index;
mod memory;

pub use http::HttpIndex;
pub use index::IndexDirectory;
pub use memory::MemorySource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::requirements::{PackageRef, Version};
use crate::settings::{SettingsAxis, SettingsContext};

/// Errors a metadata lookup can produce.
///
/// Only [`LookupError::Transient`] is retried by the resolver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
  #[error("package not found")]
  NotFound,

  #[error("temporarily unavailable: {0}")]
  Transient(String),

  #[error("invalid metadata: {0}")]
  Invalid(String),
}

/// Artifact layout of a package, relative to its package folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CppInfo {
  #[serde(default = "default_include_dirs")]
  pub include_dirs: Vec<String>,
  #[serde(default = "default_lib_dirs")]
  pub lib_dirs: Vec<String>,
  #[serde(default)]
  pub libs: Vec<String>,
  #[serde(default)]
  pub defines: Vec<String>,
}

fn default_include_dirs() -> Vec<String> {
  vec!["include".to_string()]
}

fn default_lib_dirs() -> Vec<String> {
  vec!["lib".to_string()]
}

impl Default for CppInfo {
  fn default() -> Self {
    Self {
      include_dirs: default_include_dirs(),
      lib_dirs: default_lib_dirs(),
      libs: Vec::new(),
      defines: Vec::new(),
    }
  }
}

/// One available version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
  pub version: Version,
  #[serde(default)]
  pub requires: Vec<PackageRef>,
  /// Axes the package's binary depends on. `None` means every axis in the
  /// context; an empty list marks a header-only package.
  #[serde(default)]
  pub settings: Option<Vec<SettingsAxis>>,
  #[serde(default)]
  pub cpp_info: CppInfo,
}

impl Candidate {
  pub fn new(version: Version) -> Self {
    Self {
      version,
      requires: Vec::new(),
      settings: None,
      cpp_info: CppInfo::default(),
    }
  }

  pub fn requires(mut self, reference: PackageRef) -> Self {
    self.requires.push(reference);
    self
  }

  pub fn settings(mut self, axes: impl IntoIterator<Item = SettingsAxis>) -> Self {
    self.settings = Some(axes.into_iter().collect());
    self
  }

  pub fn libs(mut self, libs: impl IntoIterator<Item = impl Into<String>>) -> Self {
    self.cpp_info.libs = libs.into_iter().map(Into::into).collect();
    self
  }

  pub fn cpp_info(mut self, cpp_info: CppInfo) -> Self {
    self.cpp_info = cpp_info;
    self
  }
}

/// The `<name>.json` document served by index directories and HTTP indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDocument {
  pub name: String,
  #[serde(default)]
  pub versions: Vec<Candidate>,
}

/// Parse an index document and check it describes `name`.
pub fn parse_index_document(name: &str, bytes: &[u8]) -> Result<Vec<Candidate>, LookupError> {
  let doc: IndexDocument =
    serde_json::from_slice(bytes).map_err(|e| LookupError::Invalid(format!("{}.json: {}", name, e)))?;

  if doc.name != name {
    return Err(LookupError::Invalid(format!(
      "{}.json describes package '{}'",
      name, doc.name
    )));
  }

  Ok(doc.versions)
}

/// Answers metadata queries for the resolver.
///
/// Candidates are returned in declaration order; the resolver uses that
/// order to break ties between equal versions.
#[async_trait]
pub trait MetadataSource: Send + Sync {
  async fn lookup_candidates(&self, name: &str, settings: &SettingsContext) -> Result<Vec<Candidate>, LookupError>;

  /// Human-readable description for logs.
  fn describe(&self) -> String;
}
