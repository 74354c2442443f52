use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{RequirementError, VersionConstraint};

/// A `name/constraint` reference to a package, e.g. `spdlog/1.13.0` or
/// `liby/[>=1.0 <2.0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageRef {
  name: String,
  constraint: VersionConstraint,
}

impl PackageRef {
  pub fn new(name: impl Into<String>, constraint: VersionConstraint) -> Result<Self, RequirementError> {
    let name = name.into();
    validate_name(&name, &name)?;
    Ok(Self { name, constraint })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn constraint(&self) -> &VersionConstraint {
    &self.constraint
  }
}

fn validate_name(name: &str, reference: &str) -> Result<(), RequirementError> {
  if name.is_empty() {
    return Err(RequirementError::InvalidReference {
      reference: reference.to_string(),
      reason: "package name is empty".to_string(),
    });
  }
  if let Some(c) = name
    .chars()
    .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+')))
  {
    return Err(RequirementError::InvalidReference {
      reference: reference.to_string(),
      reason: format!("invalid character '{}' in package name", c),
    });
  }
  // Names become directory components under the package root.
  if name.chars().all(|c| c == '.') {
    return Err(RequirementError::InvalidReference {
      reference: reference.to_string(),
      reason: "package name must not consist only of dots".to_string(),
    });
  }
  Ok(())
}

impl FromStr for PackageRef {
  type Err = RequirementError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let text = s.trim();
    let (name, constraint) = text.split_once('/').ok_or_else(|| RequirementError::InvalidReference {
      reference: text.to_string(),
      reason: "expected 'name/version'".to_string(),
    })?;

    validate_name(name, text)?;

    if constraint.trim().is_empty() {
      return Err(RequirementError::InvalidReference {
        reference: text.to_string(),
        reason: "version constraint is empty".to_string(),
      });
    }

    Ok(Self {
      name: name.to_string(),
      constraint: constraint.parse()?,
    })
  }
}

impl TryFrom<String> for PackageRef {
  type Error = RequirementError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<PackageRef> for String {
  fn from(value: PackageRef) -> Self {
    value.to_string()
  }
}

impl fmt::Display for PackageRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.name, self.constraint)
  }
}
