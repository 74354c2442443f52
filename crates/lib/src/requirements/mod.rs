//! Package references and the ordered requirement set.
//!
//! A [`RequirementSet`] holds the root requirements of a recipe in
//! declaration order. Each name appears at most once: re-adding an
//! identical reference is a no-op, a different constraint for the same
//! name is a [`RequirementError::DuplicateRequirement`].

mod reference;
mod version;

pub use reference::PackageRef;
pub use version::{Version, VersionConstraint};

use thiserror::Error;
use tracing::debug;

/// Errors from parsing references and building requirement sets.
#[derive(Debug, Error)]
pub enum RequirementError {
  #[error("duplicate requirement for '{name}': '{existing}' conflicts with '{requested}'")]
  DuplicateRequirement {
    name: String,
    existing: String,
    requested: String,
  },

  #[error("invalid package reference '{reference}': {reason}")]
  InvalidReference { reference: String, reason: String },

  #[error("invalid version '{version}': {reason}")]
  InvalidVersion { version: String, reason: String },

  #[error("invalid version constraint '{constraint}': {reason}")]
  InvalidConstraint { constraint: String, reason: String },
}

/// Ordered, duplicate-checked root requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSet {
  refs: Vec<PackageRef>,
}

impl RequirementSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a set from references, failing on the first duplicate.
  pub fn from_refs<I>(refs: I) -> Result<Self, RequirementError>
  where
    I: IntoIterator<Item = PackageRef>,
  {
    let mut set = Self::new();
    for r in refs {
      set.add(r)?;
    }
    Ok(set)
  }

  /// Add a reference.
  ///
  /// Adding a reference identical to one already present leaves the set
  /// unchanged.
  pub fn add(&mut self, reference: PackageRef) -> Result<(), RequirementError> {
    if let Some(existing) = self.get(reference.name()) {
      if existing.constraint() == reference.constraint() {
        debug!(reference = %reference, "requirement already present");
        return Ok(());
      }
      return Err(RequirementError::DuplicateRequirement {
        name: reference.name().to_string(),
        existing: existing.to_string(),
        requested: reference.to_string(),
      });
    }
    self.refs.push(reference);
    Ok(())
  }

  /// All references in declaration order.
  pub fn all(&self) -> impl Iterator<Item = &PackageRef> + '_ {
    self.refs.iter()
  }

  pub fn get(&self, name: &str) -> Option<&PackageRef> {
    self.refs.iter().find(|r| r.name() == name)
  }

  pub fn len(&self) -> usize {
    self.refs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.refs.is_empty()
  }
}
