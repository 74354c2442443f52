//! Settings axes and the settings context.
//!
//! The context maps each [`SettingsAxis`] to a value. Its fingerprint is
//! computed over `axis=value` lines sorted by canonical axis name, so two
//! contexts with the same assignments always fingerprint the same,
//! whatever order they were built in.

mod profile;

pub use profile::{load_profile, parse_profile};

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::platform::Host;
use crate::util::hash::{Fingerprint, fingerprint_bytes};

/// Errors from building a settings context.
#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("missing settings axis '{axis}'")]
  MissingAxis { axis: SettingsAxis },

  #[error("unknown settings axis '{name}' (expected one of: {})", SettingsAxis::names())]
  UnknownAxis { name: String },

  #[error("invalid settings assignment '{assignment}': {reason}")]
  InvalidAssignment { assignment: String, reason: String },

  #[error("failed to read profile {path}: {source}")]
  ProfileRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse profile {path}: {message}")]
  ProfileParse { path: PathBuf, message: String },
}

/// A named dimension of the build configuration.
///
/// Variants are declared in canonical-name order so the derived `Ord`
/// matches the sort used for fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SettingsAxis {
  Arch,
  BuildType,
  Compiler,
  CompilerVersion,
  Os,
}

impl SettingsAxis {
  pub const ALL: [SettingsAxis; 5] = [
    SettingsAxis::Arch,
    SettingsAxis::BuildType,
    SettingsAxis::Compiler,
    SettingsAxis::CompilerVersion,
    SettingsAxis::Os,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      SettingsAxis::Arch => "arch",
      SettingsAxis::BuildType => "build_type",
      SettingsAxis::Compiler => "compiler",
      SettingsAxis::CompilerVersion => "compiler_version",
      SettingsAxis::Os => "os",
    }
  }

  fn names() -> String {
    Self::ALL.iter().map(|a| a.as_str()).collect::<Vec<_>>().join(", ")
  }
}

impl FromStr for SettingsAxis {
  type Err = SettingsError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "arch" => Ok(SettingsAxis::Arch),
      "build_type" | "buildType" => Ok(SettingsAxis::BuildType),
      "compiler" => Ok(SettingsAxis::Compiler),
      "compiler_version" | "compiler.version" | "compilerVersion" => Ok(SettingsAxis::CompilerVersion),
      "os" => Ok(SettingsAxis::Os),
      other => Err(SettingsError::UnknownAxis { name: other.to_string() }),
    }
  }
}

impl TryFrom<String> for SettingsAxis {
  type Error = SettingsError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<SettingsAxis> for String {
  fn from(value: SettingsAxis) -> Self {
    value.as_str().to_string()
  }
}

impl fmt::Display for SettingsAxis {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Assignment of values to settings axes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsContext {
  values: BTreeMap<SettingsAxis, String>,
}

impl SettingsContext {
  pub fn new() -> Self {
    Self::default()
  }

  /// Defaults for the running host.
  ///
  /// `compiler_version` is left unset; it has no reliable host default.
  pub fn detect() -> Self {
    let mut ctx = Self::new();
    match Host::detect() {
      Some(host) => {
        debug!(host = %host, "detected host platform");
        for (axis, value) in host.default_settings() {
          ctx.set(axis, value);
        }
      }
      // Unsupported host: report it as-is and leave the compiler unset.
      None => {
        ctx.set(SettingsAxis::Os, std::env::consts::OS);
        ctx.set(SettingsAxis::Arch, std::env::consts::ARCH);
      }
    }
    ctx.set(SettingsAxis::BuildType, "Release");
    ctx
  }

  /// Set an axis, replacing any previous value.
  pub fn set(&mut self, axis: SettingsAxis, value: impl Into<String>) {
    self.values.insert(axis, value.into());
  }

  /// Builder-style [`set`](Self::set).
  pub fn with(mut self, axis: SettingsAxis, value: impl Into<String>) -> Self {
    self.set(axis, value);
    self
  }

  /// Apply an `axis=value` assignment as written on the command line.
  pub fn assign(&mut self, assignment: &str) -> Result<(), SettingsError> {
    let (axis, value) = assignment
      .split_once('=')
      .ok_or_else(|| SettingsError::InvalidAssignment {
        assignment: assignment.to_string(),
        reason: "expected 'axis=value'".to_string(),
      })?;

    let axis: SettingsAxis = axis.parse()?;
    let value = value.trim();
    validate_value(assignment, value)?;
    self.set(axis, value);
    Ok(())
  }

  pub fn get(&self, axis: SettingsAxis) -> Result<&str, SettingsError> {
    self
      .values
      .get(&axis)
      .map(String::as_str)
      .ok_or(SettingsError::MissingAxis { axis })
  }

  pub fn contains(&self, axis: SettingsAxis) -> bool {
    self.values.contains_key(&axis)
  }

  /// Ensure every axis in `axes` has a value.
  ///
  /// The error names the first missing axis in canonical order.
  pub fn require(&self, axes: &[SettingsAxis]) -> Result<(), SettingsError> {
    match self.first_missing(axes) {
      Some(axis) => Err(SettingsError::MissingAxis { axis }),
      None => Ok(()),
    }
  }

  /// The first axis of `axes`, in canonical order, without a value.
  pub fn first_missing(&self, axes: &[SettingsAxis]) -> Option<SettingsAxis> {
    axes.iter().copied().filter(|a| !self.contains(*a)).min()
  }

  /// Overlay `other` on top of this context.
  pub fn merge(&mut self, other: &SettingsContext) {
    for (axis, value) in &other.values {
      self.values.insert(*axis, value.clone());
    }
  }

  /// Axes with a value, in canonical order.
  pub fn axes(&self) -> impl Iterator<Item = SettingsAxis> + '_ {
    self.values.keys().copied()
  }

  pub fn iter(&self) -> impl Iterator<Item = (SettingsAxis, &str)> + '_ {
    self.values.iter().map(|(a, v)| (*a, v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Fingerprint of the whole context.
  pub fn fingerprint(&self) -> Fingerprint {
    fingerprint_bytes(self.canonical_lines(|_| true).as_bytes())
  }

  /// Fingerprint of the context restricted to `axes`.
  ///
  /// Axes without a value are skipped; callers check presence first.
  pub fn fingerprint_subset(&self, axes: &[SettingsAxis]) -> Fingerprint {
    fingerprint_bytes(self.canonical_lines(|a| axes.contains(&a)).as_bytes())
  }

  fn canonical_lines(&self, include: impl Fn(SettingsAxis) -> bool) -> String {
    let mut out = String::new();
    for (axis, value) in self.iter().filter(|(a, _)| include(*a)) {
      out.push_str(axis.as_str());
      out.push('=');
      out.push_str(value);
      out.push('\n');
    }
    out
  }
}

fn validate_value(assignment: &str, value: &str) -> Result<(), SettingsError> {
  if value.is_empty() {
    return Err(SettingsError::InvalidAssignment {
      assignment: assignment.to_string(),
      reason: "value is empty".to_string(),
    });
  }
  if value.contains(['\n', '\r', '=']) {
    return Err(SettingsError::InvalidAssignment {
      assignment: assignment.to_string(),
      reason: "value must not contain '=' or line breaks".to_string(),
    });
  }
  Ok(())
}

impl fmt::Display for SettingsContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self.iter().map(|(a, v)| format!("{}={}", a, v)).collect();
    write!(f, "{}", parts.join(", "))
  }
}
