//! Concrete versions and version constraints.
//!
//! Recipe versions are looser than semver: `0.64` and `1.14.0` are both
//! valid. A [`Version`] keeps the text as written and orders by its
//! zero-filled semantic form, so `0.64` sorts as `0.64.0`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use semver::{Prerelease, VersionReq};
use serde::{Deserialize, Serialize};

use super::RequirementError;

/// A concrete package version.
///
/// Equality, ordering and hashing use the zero-filled semantic form, so
/// `1.2` and `1.2.0` compare equal while still displaying as written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
  raw: String,
  semver: semver::Version,
}

impl Version {
  /// The version exactly as it was written.
  pub fn as_str(&self) -> &str {
    &self.raw
  }

  /// The zero-filled semantic version used for ordering.
  pub fn semver(&self) -> &semver::Version {
    &self.semver
  }
}

impl FromStr for Version {
  type Err = RequirementError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let raw = s.trim();
    let invalid = |reason: &str| RequirementError::InvalidVersion {
      version: raw.to_string(),
      reason: reason.to_string(),
    };

    if raw.is_empty() {
      return Err(invalid("version is empty"));
    }

    let (core, pre) = match raw.split_once('-') {
      Some((core, pre)) => (core, Some(pre)),
      None => (raw, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
      return Err(invalid("at most three numeric components are supported"));
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
      if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("components must be non-negative integers"));
      }
      *slot = part.parse().map_err(|_| invalid("component out of range"))?;
    }

    let mut semver = semver::Version::new(numbers[0], numbers[1], numbers[2]);
    if let Some(pre) = pre {
      semver.pre = Prerelease::new(pre).map_err(|e| invalid(&e.to_string()))?;
    }

    Ok(Self {
      raw: raw.to_string(),
      semver,
    })
  }
}

impl TryFrom<String> for Version {
  type Error = RequirementError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Version> for String {
  fn from(value: Version) -> Self {
    value.raw
  }
}

impl PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.semver == other.semver
  }
}

impl Eq for Version {}

impl Hash for Version {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.semver.hash(state);
  }
}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    self.semver.cmp(&other.semver)
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

/// A constraint on acceptable versions of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
  /// A bare version pins exactly that version.
  Exact(Version),
  /// A range, written `[>=1.0 <2.0]` or `>=1.0,<2.0`.
  Range(VersionReq),
}

impl VersionConstraint {
  /// Whether `version` satisfies this constraint.
  pub fn matches(&self, version: &Version) -> bool {
    match self {
      VersionConstraint::Exact(pinned) => pinned == version,
      VersionConstraint::Range(req) => req.matches(version.semver()),
    }
  }

  /// The pinned version, when this constraint is an exact pin.
  pub fn exact(&self) -> Option<&Version> {
    match self {
      VersionConstraint::Exact(v) => Some(v),
      VersionConstraint::Range(_) => None,
    }
  }
}

impl FromStr for VersionConstraint {
  type Err = RequirementError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let text = s.trim();
    let bracketed = text.starts_with('[') && text.ends_with(']') && text.len() >= 2;
    let body = if bracketed { &text[1..text.len() - 1] } else { text };

    let is_range = bracketed
      || body
        .chars()
        .any(|c| matches!(c, '<' | '>' | '=' | '^' | '~' | '*' | ',') || c.is_whitespace());

    if !is_range {
      return body.parse().map(VersionConstraint::Exact);
    }

    let normalized = normalize_range(body);
    if normalized.is_empty() {
      return Err(RequirementError::InvalidConstraint {
        constraint: text.to_string(),
        reason: "range is empty".to_string(),
      });
    }

    VersionReq::parse(&normalized)
      .map(VersionConstraint::Range)
      .map_err(|e| RequirementError::InvalidConstraint {
        constraint: text.to_string(),
        reason: e.to_string(),
      })
  }
}

/// Rewrite a space- or comma-separated comparator list into the
/// comma-separated form `semver` understands. Operators written apart from
/// their version (`>= 1.0`) are joined back together.
fn normalize_range(body: &str) -> String {
  let mut comparators: Vec<String> = Vec::new();
  let mut pending_op = String::new();

  for token in body.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
    if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
      pending_op.push_str(token);
      continue;
    }
    comparators.push(format!("{}{}", std::mem::take(&mut pending_op), token));
  }

  if !pending_op.is_empty() {
    comparators.push(pending_op);
  }

  comparators.join(", ")
}

impl fmt::Display for VersionConstraint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionConstraint::Exact(v) => write!(f, "{}", v),
      VersionConstraint::Range(req) => {
        let text = req.to_string().replace(", ", " ");
        write!(f, "[{}]", text)
      }
    }
  }
}
